//! Page rendering.
//!
//! A [`Renderer`] is built once at startup and shared read-only by every
//! request. It owns a `minijinja` environment with two namespaces: pages
//! come only from the views directory, so a page named `login` is
//! `views/login.html`, while `{% include "footer" %}` searches the partial
//! directories in order (local partials, then the vendored SDK's). A partial
//! can never be requested as a page.
//!
//! Templates get two translation helpers bound to the render context's
//! `locale`:
//!
//! - `__(key, *args)`: catalog lookup with `%s` substitution
//! - `__n(key, count)`: plural lookup (`key.one` / `key.other`)

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::value::{Rest, Value as TemplateValue};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, State};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::LoginContext;
use crate::error::RenderError;
use crate::eula::EulaDocument;
use crate::i18n::Catalog;
use crate::is_safe_segment;
use crate::locale::Locale;

/// Page rendered when no module is named.
pub const LOGIN_TEMPLATE: &str = "login";

/// Page used for EULA documents.
pub const EULA_TEMPLATE: &str = "eula";

/// File extension of templates on disk.
pub const TEMPLATE_EXTENSION: &str = "html";

/// Data handed to a template.
///
/// The login context's keys sit at the top level next to `locale` and, for
/// EULA pages, `eula`. The context decoder rejects payloads that set either
/// reserved key, so the flattened object never has duplicates.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    #[serde(flatten)]
    login: Map<String, Value>,
    locale: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    eula: Option<Value>,
}

impl RenderContext {
    /// Context for a plain page.
    #[must_use]
    pub fn new(login: &LoginContext, locale: &Locale) -> Self {
        Self {
            login: login.as_map().clone(),
            locale: locale.clone(),
            eula: None,
        }
    }

    /// Attach the `eula` object.
    #[must_use]
    pub fn with_eula(mut self, eula: Value) -> Self {
        self.eula = Some(eula);
        self
    }
}

/// Loader namespace for pages; names without it are partials.
const PAGE_PREFIX: &str = "pages/";

/// Shared template environment.
pub struct Renderer {
    env: Environment<'static>,
    views: PathBuf,
    partials: Vec<PathBuf>,
}

impl Renderer {
    /// Build a renderer with pages from `views` and partials searched in
    /// `partials` order.
    #[must_use]
    pub fn new(views: PathBuf, partials: Vec<PathBuf>, catalog: Arc<Catalog>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let page_roots = vec![views.clone()];
        let partial_roots = partials.clone();
        env.set_loader(move |name| match name.strip_prefix(PAGE_PREFIX) {
            Some(page) => load_template(&page_roots, page),
            None => load_template(&partial_roots, name),
        });

        let cat = Arc::clone(&catalog);
        env.add_function(
            "__",
            move |state: &State, key: String, args: Rest<TemplateValue>| -> String {
                let locale = active_locale(state, &cat);
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                cat.translate(&locale, &key, &args)
            },
        );

        let cat = catalog;
        env.add_function(
            "__n",
            move |state: &State, key: String, count: i64| -> String {
                let locale = active_locale(state, &cat);
                cat.translate_plural(&locale, &key, count)
            },
        );

        Self {
            env,
            views,
            partials,
        }
    }

    /// Directory pages are loaded from.
    #[must_use]
    pub fn views(&self) -> &Path {
        &self.views
    }

    /// Directories searched for partials, in order.
    #[must_use]
    pub fn partials(&self) -> &[PathBuf] {
        &self.partials
    }

    /// Render the page called `name`.
    ///
    /// # Errors
    ///
    /// [`RenderError::TemplateNotFound`] if the views directory has no
    /// `name`, otherwise [`RenderError::Render`] for parse or evaluation
    /// failures (including a missing partial).
    pub fn render(&self, name: &str, ctx: &RenderContext) -> Result<String, RenderError> {
        let page = format!("{PAGE_PREFIX}{name}");
        let template = self.env.get_template(&page).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                RenderError::TemplateNotFound {
                    name: name.to_owned(),
                }
            } else {
                render_failed(name, &e)
            }
        })?;

        template.render(ctx).map_err(|e| render_failed(name, &e))
    }

    /// Render an EULA page.
    ///
    /// The compiled document HTML is itself evaluated as a template against
    /// the page context before it is stored as `eula.content`, so documents
    /// can reference login context values and translation helpers.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the document body or the `eula` page fails.
    pub fn render_eula(
        &self,
        doc: &EulaDocument,
        login: &LoginContext,
        locale: &Locale,
    ) -> Result<String, RenderError> {
        let base = RenderContext::new(login, locale);
        let source_name = format!("eulas/{}/{}.md", doc.id, doc.locale);
        let content = self
            .env
            .render_named_str(&source_name, &doc.body_html, &base)
            .map_err(|e| render_failed(&source_name, &e))?;

        let ctx = base.with_eula(doc.with_content(content));
        self.render(EULA_TEMPLATE, &ctx)
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("views", &self.views)
            .field("partials", &self.partials)
            .finish_non_exhaustive()
    }
}

fn render_failed(name: &str, err: &Error) -> RenderError {
    RenderError::Render {
        name: name.to_owned(),
        reason: format!("{err:#}"),
    }
}

fn active_locale(state: &State, catalog: &Catalog) -> Locale {
    state
        .lookup("locale")
        .and_then(|v| v.as_str().and_then(|s| Locale::parse(s).ok()))
        .unwrap_or_else(|| catalog.default_locale().clone())
}

/// Find `<root>/<name>.html` in the first root that has it.
///
/// Names may contain `/` for partials in subdirectories; every segment must
/// be a plain file name.
fn load_template(roots: &[PathBuf], name: &str) -> Result<Option<String>, Error> {
    if !name.split('/').all(is_safe_segment) {
        debug!(name, "refusing template name");
        return Ok(None);
    }

    let file = format!("{name}.{TEMPLATE_EXTENSION}");
    for root in roots {
        let path = root.join(&file);
        match std::fs::read_to_string(&path) {
            Ok(source) => return Ok(Some(source)),
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read template '{}'", path.display()),
                )
                .with_source(e));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        views: PathBuf,
        partials: PathBuf,
        sdk: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        let partials = dir.path().join("partials");
        let sdk = dir.path().join("sdk");
        for d in [&views, &partials, &sdk] {
            std::fs::create_dir(d).unwrap();
        }
        Fixture {
            _dir: dir,
            views,
            partials,
            sdk,
        }
    }

    fn write(dir: &Path, name: &str, source: &str) {
        std::fs::write(dir.join(format!("{name}.html")), source).unwrap();
    }

    fn locale(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn catalog() -> Arc<Catalog> {
        let mut tables = BTreeMap::new();
        let en = json!({"login": {"title": "Sign in"}, "hi": "Hello %s",
                        "tries": {"one": "%d try", "other": "%d tries"}});
        let de = json!({"login": {"title": "Anmelden"}});
        tables.insert(locale("en_US"), en.as_object().unwrap().clone());
        tables.insert(locale("de_DE"), de.as_object().unwrap().clone());
        Arc::new(Catalog::from_tables(tables, locale("en_US")).unwrap())
    }

    fn renderer(f: &Fixture) -> Renderer {
        Renderer::new(
            f.views.clone(),
            vec![f.partials.clone(), f.sdk.clone()],
            catalog(),
        )
    }

    fn login(value: Value) -> LoginContext {
        LoginContext::from_value(value).unwrap()
    }

    #[test]
    fn renders_context_and_translations() {
        let f = fixture();
        write(
            &f.views,
            "login",
            "{{ __('login.title') }}|{{ __('hi', user) }}|{{ __n('tries', 2) }}|{{ locale }}",
        );
        let r = renderer(&f);

        let ctx = RenderContext::new(&login(json!({"user": "Ada"})), &locale("en_US"));
        assert_eq!(r.render("login", &ctx).unwrap(), "Sign in|Hello Ada|2 tries|en_US");

        let ctx = RenderContext::new(&login(json!({"user": "Ada"})), &locale("de_DE"));
        assert_eq!(r.render("login", &ctx).unwrap(), "Anmelden|Hello Ada|2 tries|de_DE");
    }

    #[test]
    fn escapes_context_values() {
        let f = fixture();
        write(&f.views, "login", "{{ user }}");
        let r = renderer(&f);

        let ctx = RenderContext::new(&login(json!({"user": "<b>x"})), &locale("en_US"));
        assert_eq!(r.render("login", &ctx).unwrap(), "&lt;b&gt;x");
    }

    #[test]
    fn local_partials_shadow_sdk_partials() {
        let f = fixture();
        write(&f.views, "login", "{% include 'footer' %}/{% include 'brand' %}");
        write(&f.partials, "footer", "local footer");
        write(&f.sdk, "footer", "sdk footer");
        write(&f.sdk, "brand", "sdk brand");
        let r = renderer(&f);

        let ctx = RenderContext::new(&LoginContext::empty(), &locale("en_US"));
        assert_eq!(r.render("login", &ctx).unwrap(), "local footer/sdk brand");
    }

    #[test]
    fn unknown_template_is_not_found() {
        let f = fixture();
        let r = renderer(&f);
        let ctx = RenderContext::new(&LoginContext::empty(), &locale("en_US"));

        for name in ["missing", "../views/login", "a/../b", ".hidden/x/.."] {
            let result = r.render(name, &ctx);
            assert!(
                matches!(result, Err(RenderError::TemplateNotFound { .. })),
                "{name} should be not found"
            );
        }
    }

    #[test]
    fn partials_are_not_pages() {
        let f = fixture();
        write(&f.partials, "head", "local head");
        write(&f.sdk, "footer", "sdk footer");
        let r = renderer(&f);
        let ctx = RenderContext::new(&LoginContext::empty(), &locale("en_US"));

        for name in ["head", "footer"] {
            assert!(
                matches!(r.render(name, &ctx), Err(RenderError::TemplateNotFound { .. })),
                "{name} should not render as a page"
            );
        }
    }

    #[test]
    fn views_are_not_partials() {
        let f = fixture();
        write(&f.views, "login", "{% include 'eula' %}");
        write(&f.views, "eula", "page");
        let r = renderer(&f);
        let ctx = RenderContext::new(&LoginContext::empty(), &locale("en_US"));

        assert!(matches!(r.render("login", &ctx), Err(RenderError::Render { .. })));
    }

    #[test]
    fn missing_partial_is_a_render_error() {
        let f = fixture();
        write(&f.views, "login", "{% include 'nowhere' %}");
        let r = renderer(&f);
        let ctx = RenderContext::new(&LoginContext::empty(), &locale("en_US"));

        let result = r.render("login", &ctx);
        assert!(matches!(result, Err(RenderError::Render { .. })));
    }

    #[test]
    fn eula_body_is_compiled_against_page_context() {
        let f = fixture();
        write(
            &f.views,
            "eula",
            "{{ eula.subtitle }} v{{ eula.version }}: {{ eula.content|safe }}",
        );
        let r = renderer(&f);

        let mut metadata = Map::new();
        metadata.insert("subtitle".to_owned(), json!("Terms"));
        metadata.insert("version".to_owned(), json!("4"));
        let doc = EulaDocument {
            id: "doc".to_owned(),
            locale: locale("en_US"),
            metadata,
            body: "Hi **{{ tenant }}**".to_owned(),
            body_html: "<p>Hi <strong>{{ tenant }}</strong></p>\n".to_owned(),
        };

        let html = r
            .render_eula(&doc, &login(json!({"tenant": "Acme"})), &locale("en_US"))
            .unwrap();
        assert_eq!(html, "Terms v4: <p>Hi <strong>Acme</strong></p>");
    }

    #[test]
    fn render_context_serializes_flat() {
        let ctx = RenderContext::new(&login(json!({"a": 1})), &locale("en_US"));
        assert_eq!(
            serde_json::to_value(&ctx).unwrap(),
            json!({"a": 1, "locale": "en_US"})
        );

        let ctx = ctx.with_eula(json!({"version": "1"}));
        assert_eq!(
            serde_json::to_value(&ctx).unwrap(),
            json!({"a": 1, "locale": "en_US", "eula": {"version": "1"}})
        );
    }
}
