//! EULA document store.
//!
//! Documents live on disk, one directory per document id:
//!
//! ```text
//! eulas/
//!   944b0637-7e75-4568-9991-b0297314e5ad/
//!     meta.json     {"subtitle": "...", "version": "..."}
//!     en_US.md
//!     de_DE.md
//! ```
//!
//! Nothing is cached: every resolve re-reads `meta.json` and the locale body,
//! so edits on disk show up on the next request.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EulaError;
use crate::is_safe_segment;
use crate::locale::Locale;
use crate::markdown;

/// File name of the per-document metadata.
pub const METADATA_FILE: &str = "meta.json";

/// Metadata fields every document must define.
pub const REQUIRED_FIELDS: &[&str] = &["subtitle", "version"];

/// A resolved EULA document for one locale.
#[derive(Debug, Clone)]
pub struct EulaDocument {
    /// Document id (its directory name).
    pub id: String,
    /// Locale the body was selected for.
    pub locale: Locale,
    /// Parsed `meta.json`.
    pub metadata: Map<String, Value>,
    /// Markdown body as stored on disk.
    pub body: String,
    /// Body compiled to HTML.
    pub body_html: String,
}

impl EulaDocument {
    /// Metadata with `content` set to `content`, as templates see `eula`.
    #[must_use]
    pub fn with_content(&self, content: String) -> Value {
        let mut meta = self.metadata.clone();
        meta.insert("content".to_owned(), Value::String(content));
        Value::Object(meta)
    }
}

/// Reads EULA documents from a root directory.
#[derive(Debug, Clone)]
pub struct EulaStore {
    root: PathBuf,
}

impl EulaStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve document `id` for `locale`.
    ///
    /// Returns [`EulaError::NotFound`] before touching any file when the id is
    /// not a plain directory name or the directory does not exist. There is
    /// no locale fallback.
    ///
    /// # Errors
    ///
    /// - [`EulaError::NotFound`] for an unknown or unsafe id.
    /// - [`EulaError::InvalidMetadata`] if `meta.json` is missing or malformed.
    /// - [`EulaError::LocaleNotFound`] if there is no `<locale>.md`.
    /// - [`EulaError::Io`] for other filesystem failures.
    pub async fn resolve(&self, id: &str, locale: &Locale) -> Result<EulaDocument, EulaError> {
        if !is_safe_segment(id) {
            return Err(EulaError::NotFound { id: id.to_owned() });
        }

        let dir = self.root.join(id);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(EulaError::NotFound { id: id.to_owned() }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EulaError::NotFound { id: id.to_owned() });
            }
            Err(source) => {
                return Err(EulaError::Io {
                    id: id.to_owned(),
                    source,
                });
            }
        }

        let metadata = read_metadata(id, &dir.join(METADATA_FILE)).await?;

        let body_path = dir.join(format!("{locale}.md"));
        let body = match tokio::fs::read_to_string(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EulaError::LocaleNotFound {
                    id: id.to_owned(),
                    locale: locale.to_string(),
                });
            }
            Err(source) => {
                return Err(EulaError::Io {
                    id: id.to_owned(),
                    source,
                });
            }
        };

        let body_html = markdown::to_html(&body);
        debug!(id, locale = %locale, bytes = body.len(), "eula resolved");

        Ok(EulaDocument {
            id: id.to_owned(),
            locale: locale.clone(),
            metadata,
            body,
            body_html,
        })
    }
}

async fn read_metadata(id: &str, path: &Path) -> Result<Map<String, Value>, EulaError> {
    let invalid = |reason: String| EulaError::InvalidMetadata {
        id: id.to_owned(),
        reason,
    };

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(invalid(format!("{METADATA_FILE} is missing")));
        }
        Err(source) => {
            return Err(EulaError::Io {
                id: id.to_owned(),
                source,
            });
        }
    };

    let parsed = serde_json::from_str::<Value>(&text).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(map) = parsed else {
        return Err(invalid(format!("{METADATA_FILE} is not an object")));
    };

    for field in REQUIRED_FIELDS {
        match map.get(*field) {
            Some(Value::String(_) | Value::Number(_)) => {}
            Some(_) => return Err(invalid(format!("'{field}' must be a string or number"))),
            None => return Err(invalid(format!("'{field}' is missing"))),
        }
    }

    Ok(map)
}
