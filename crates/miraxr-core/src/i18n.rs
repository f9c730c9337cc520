//! Translation catalogs.
//!
//! One JSON file per locale under the translations directory
//! (`assets/translations/en_US.json`, ...). The same files are served to the
//! browser, so the server-rendered pages and the client shim read identical
//! strings.
//!
//! Keys use object notation: `__("login.title")` walks `{"login": {"title":
//! ..}}`. A key missing from the requested locale falls back to the default
//! locale and then to the key itself.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::locale::Locale;

/// Read-only translation tables for every supported locale.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: BTreeMap<Locale, Map<String, Value>>,
    default: Locale,
}

impl Catalog {
    /// Load every `<locale>.json` file in `dir`.
    ///
    /// Files whose stem is not a valid locale code are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the directory or a catalog cannot be read,
    /// a catalog is not a JSON object, or `default` has no catalog.
    pub fn load(dir: &Path, default: &Locale) -> Result<Self, CatalogError> {
        let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut tables = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Locale::parse(s).ok())
            else {
                debug!(path = %path.display(), "skipping catalog with non-locale name");
                continue;
            };

            let text = std::fs::read_to_string(&path).map_err(|source| CatalogError::Read {
                path: path.clone(),
                source,
            })?;
            let table = match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(CatalogError::Parse {
                        path,
                        reason: "top level is not an object".to_owned(),
                    });
                }
                Err(e) => {
                    return Err(CatalogError::Parse {
                        path,
                        reason: e.to_string(),
                    });
                }
            };
            tables.insert(locale, table);
        }

        let catalog = Self::from_tables(tables, default.clone())?;
        info!(
            locales = ?catalog.locales().iter().map(Locale::as_str).collect::<Vec<_>>(),
            default = %default,
            "translation catalogs loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from in-memory tables.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingDefault`] if `default` has no table.
    pub fn from_tables(
        tables: BTreeMap<Locale, Map<String, Value>>,
        default: Locale,
    ) -> Result<Self, CatalogError> {
        if !tables.contains_key(&default) {
            return Err(CatalogError::MissingDefault {
                locale: default.to_string(),
            });
        }
        Ok(Self { tables, default })
    }

    /// Locales with a catalog, sorted.
    #[must_use]
    pub fn locales(&self) -> Vec<Locale> {
        self.tables.keys().cloned().collect()
    }

    /// The fallback locale.
    #[must_use]
    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    /// Translate `key` for `locale`, replacing each `%s` with the next of `args`.
    #[must_use]
    pub fn translate(&self, locale: &Locale, key: &str, args: &[String]) -> String {
        let template = self.lookup_str(locale, key).unwrap_or(key);
        substitute(template, "%s", args)
    }

    /// Translate a plural key for `locale`.
    ///
    /// Uses `key.one` when `count == 1` and `key.other` otherwise, falling back
    /// to a plain string at `key`. `%d` and `%s` are replaced with the count.
    #[must_use]
    pub fn translate_plural(&self, locale: &Locale, key: &str, count: i64) -> String {
        let form = if count == 1 { "one" } else { "other" };
        let template = self
            .lookup_str(locale, &format!("{key}.{form}"))
            .or_else(|| self.lookup_str(locale, key))
            .map_or_else(|| key.to_owned(), str::to_owned);
        let count = count.to_string();
        template.replace("%d", &count).replace("%s", &count)
    }

    fn lookup_str(&self, locale: &Locale, key: &str) -> Option<&str> {
        let found = self
            .tables
            .get(locale)
            .and_then(|t| lookup(t, key))
            .or_else(|| {
                debug!(locale = %locale, key, "translation missing, trying default locale");
                self.tables.get(&self.default).and_then(|t| lookup(t, key))
            });
        if found.is_none() {
            debug!(locale = %locale, key, "translation missing");
        }
        found
    }
}

/// Resolve a key in one table: a literal top-level key first, then a dotted
/// path through nested objects.
fn lookup<'a>(table: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    if let Some(Value::String(s)) = table.get(key) {
        return Some(s);
    }

    let mut segments = key.split('.');
    let mut current = table.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    current.as_str()
}

/// Replace `placeholder` left to right, one argument per occurrence. Surplus
/// placeholders are left untouched.
fn substitute(template: &str, placeholder: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    for arg in args {
        let Some(idx) = rest.find(placeholder) else {
            break;
        };
        out.push_str(&rest[..idx]);
        out.push_str(arg);
        rest = &rest[idx + placeholder.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locale(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn table(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn catalog() -> Catalog {
        let mut tables = BTreeMap::new();
        tables.insert(
            locale("en_US"),
            table(json!({
                "login": {"title": "Sign in", "welcome": "Welcome, %s from %s"},
                "Accept": "Accept",
                "eula": {"updated": "Updated on %s"},
                "attempts": {"one": "%d attempt left", "other": "%d attempts left"},
                "items": "%s items"
            })),
        );
        tables.insert(
            locale("de_DE"),
            table(json!({
                "login": {"title": "Anmelden"},
                "attempts": {"one": "Noch %d Versuch", "other": "Noch %d Versuche"}
            })),
        );
        Catalog::from_tables(tables, locale("en_US")).unwrap()
    }

    #[test]
    fn object_notation_lookup() {
        let c = catalog();
        assert_eq!(c.translate(&locale("de_DE"), "login.title", &[]), "Anmelden");
        assert_eq!(c.translate(&locale("en_US"), "Accept", &[]), "Accept");
    }

    #[test]
    fn falls_back_to_default_then_key() {
        let c = catalog();
        assert_eq!(
            c.translate(&locale("de_DE"), "eula.updated", &["2024-01-01".to_owned()]),
            "Updated on 2024-01-01"
        );
        assert_eq!(c.translate(&locale("de_DE"), "no.such.key", &[]), "no.such.key");
    }

    #[test]
    fn positional_substitution() {
        let c = catalog();
        let args = ["Ada".to_owned(), "Acme".to_owned()];
        assert_eq!(
            c.translate(&locale("en_US"), "login.welcome", &args),
            "Welcome, Ada from Acme"
        );
        assert_eq!(
            c.translate(&locale("en_US"), "login.welcome", &args[..1]),
            "Welcome, Ada from %s"
        );
    }

    #[test]
    fn plural_forms() {
        let c = catalog();
        assert_eq!(c.translate_plural(&locale("en_US"), "attempts", 1), "1 attempt left");
        assert_eq!(c.translate_plural(&locale("de_DE"), "attempts", 3), "Noch 3 Versuche");
        assert_eq!(c.translate_plural(&locale("en_US"), "items", 0), "0 items");
    }

    #[test]
    fn missing_default_is_rejected() {
        let result = Catalog::from_tables(BTreeMap::new(), locale("en_US"));
        assert!(matches!(result, Err(CatalogError::MissingDefault { .. })));
    }

    #[test]
    fn load_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en_US.json"), r#"{"hello": "Hello"}"#).unwrap();
        std::fs::write(dir.path().join("fr_FR.json"), r#"{"hello": "Bonjour"}"#).unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a catalog").unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

        let c = Catalog::load(dir.path(), &locale("en_US")).unwrap();
        assert_eq!(c.locales(), vec![locale("en_US"), locale("fr_FR")]);
        assert_eq!(c.translate(&locale("fr_FR"), "hello", &[]), "Bonjour");
    }

    #[test]
    fn load_rejects_non_object_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en_US.json"), "[1, 2]").unwrap();

        let result = Catalog::load(dir.path(), &locale("en_US"));
        assert!(matches!(result, Err(CatalogError::Parse { .. })));
    }
}
