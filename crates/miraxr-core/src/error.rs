//! Error types for `miraxr-core`.
//!
//! Each component owns one error enum. Variants carry the identifiers needed
//! to diagnose a failed request (document id, locale, template name) but never
//! echo the raw login context payload, which may carry user data.

use std::path::PathBuf;

/// Errors from decoding the `dana-login-context` header.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The header exceeds the accepted encoded length.
    #[error("login context header is {actual} bytes, limit is {limit}")]
    TooLarge { actual: usize, limit: usize },

    /// The header is not valid base64.
    #[error("login context is not valid base64: {reason}")]
    InvalidBase64 { reason: String },

    /// The decoded bytes are not UTF-8.
    #[error("login context is not valid UTF-8")]
    InvalidUtf8,

    /// The decoded text is not valid JSON.
    #[error("login context is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    /// The decoded JSON is valid but not an object.
    #[error("login context must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },

    /// The payload tries to set a key the server supplies itself.
    #[error("login context may not set reserved key '{key}'")]
    ReservedKey { key: String },
}

/// Errors from parsing a locale code.
#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    /// The code does not look like `ll` or `ll_RR`.
    #[error("invalid locale code '{code}'")]
    Invalid { code: String },
}

/// Errors from loading translation catalogs.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The translations directory could not be read.
    #[error("failed to read translations directory '{}': {source}", path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A catalog file could not be read.
    #[error("failed to read catalog '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A catalog file is not a JSON object.
    #[error("catalog '{}' is not a valid JSON object: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The configured default locale has no catalog file.
    #[error("default locale '{locale}' has no catalog")]
    MissingDefault { locale: String },
}

/// Errors from resolving an EULA document.
#[derive(Debug, thiserror::Error)]
pub enum EulaError {
    /// No document directory exists for this id (or the id is not a safe
    /// path segment).
    #[error("eula '{id}' not found")]
    NotFound { id: String },

    /// The document exists but has no body for the requested locale.
    #[error("eula '{id}' has no '{locale}' translation")]
    LocaleNotFound { id: String, locale: String },

    /// `meta.json` is missing, unreadable, or malformed.
    #[error("eula '{id}' has invalid metadata: {reason}")]
    InvalidMetadata { id: String, reason: String },

    /// Any other filesystem failure while reading the document.
    #[error("failed to read eula '{id}': {source}")]
    Io {
        id: String,
        source: std::io::Error,
    },
}

/// Errors from the template renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No template with this name exists in any search root.
    #[error("template '{name}' not found")]
    TemplateNotFound { name: String },

    /// The template failed to parse or render.
    #[error("failed to render '{name}': {reason}")]
    Render { name: String, reason: String },
}
