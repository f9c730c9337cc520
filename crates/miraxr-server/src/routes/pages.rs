//! Page routes: `/{domain}`, `/{domain}/{module}`, `/{domain}/eulas/{id}`.
//!
//! All paths sit under the configured base path. Handlers read the negotiated
//! [`Locale`] and decoded [`LoginContext`] that the middleware chain placed in
//! the request extensions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Extension, Router};
use tracing::info;

use miraxr_core::context::LoginContext;
use miraxr_core::locale::Locale;
use miraxr_core::render::{LOGIN_TEMPLATE, RenderContext};

use crate::error::AppError;
use crate::state::AppState;

/// Build the page router for `base_path` (already normalized).
pub fn router(base_path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{base_path}/{{domain}}"), get(default_page))
        .route(&format!("{base_path}/{{domain}}/"), get(default_page))
        .route(&format!("{base_path}/{{domain}}/eulas/{{id}}"), get(eula_page))
        .route(&format!("{base_path}/{{domain}}/{{module}}"), get(module_page))
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Render the login page.
async fn default_page(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Extension(locale): Extension<Locale>,
    Extension(ctx): Extension<LoginContext>,
) -> Result<Html<String>, AppError> {
    render_module(&state, &domain, LOGIN_TEMPLATE, &locale, &ctx)
}

/// Render the page named by the last path segment.
async fn module_page(
    State(state): State<Arc<AppState>>,
    Path((domain, module)): Path<(String, String)>,
    Extension(locale): Extension<Locale>,
    Extension(ctx): Extension<LoginContext>,
) -> Result<Html<String>, AppError> {
    render_module(&state, &domain, &module, &locale, &ctx)
}

/// Render EULA `id` in the negotiated locale.
///
/// Answers 404 without reading any document file when `id` has no directory.
async fn eula_page(
    State(state): State<Arc<AppState>>,
    Path((domain, id)): Path<(String, String)>,
    Extension(locale): Extension<Locale>,
    Extension(ctx): Extension<LoginContext>,
) -> Result<Html<String>, AppError> {
    info!(id = %id, locale = %locale, domain = %domain, "rendering eula");

    let doc = state.eulas.resolve(&id, &locale).await?;
    let html = state.renderer.render_eula(&doc, &ctx, &locale)?;
    Ok(Html(html))
}

fn render_module(
    state: &AppState,
    domain: &str,
    module: &str,
    locale: &Locale,
    ctx: &LoginContext,
) -> Result<Html<String>, AppError> {
    info!("rendering {module}@{locale} for {domain}");

    let html = state
        .renderer
        .render(module, &RenderContext::new(ctx, locale))?;
    Ok(Html(html))
}
