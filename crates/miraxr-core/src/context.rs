//! Login context decoding.
//!
//! The login service in front of this server passes per-request data in the
//! `dana-login-context` header: a base64-encoded UTF-8 JSON object. The
//! decoded object is merged into every rendered page.
//!
//! Decoding is lenient about the encoding (standard or URL-safe alphabet,
//! padding optional, embedded whitespace ignored) and strict about the shape:
//! the payload must be a JSON object, may not exceed [`MAX_HEADER_LEN`], and
//! may not set the keys the server fills in itself ([`RESERVED_KEYS`]).

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ContextError;

/// Name of the request header carrying the encoded context.
pub const HEADER_NAME: &str = "dana-login-context";

/// Maximum accepted length of the encoded header value, in bytes.
pub const MAX_HEADER_LEN: usize = 16 * 1024;

/// Keys the server adds to the render context; the header may not set them.
pub const RESERVED_KEYS: &[&str] = &["eula", "locale"];

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Per-request key/value data decoded from the login context header.
///
/// Read-only once decoded. Serializes as the plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LoginContext(Map<String, Value>);

impl LoginContext {
    /// An empty context, used when the header is absent.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode an optional header value.
    ///
    /// An absent or blank header yields an empty context.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the value is oversize, not base64, not
    /// UTF-8 JSON, not an object, or sets a reserved key.
    pub fn decode(header: Option<&str>) -> Result<Self, ContextError> {
        let Some(raw) = header.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Self::empty());
        };

        if raw.len() > MAX_HEADER_LEN {
            return Err(ContextError::TooLarge {
                actual: raw.len(),
                limit: MAX_HEADER_LEN,
            });
        }

        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();

        let bytes = LENIENT
            .decode(normalized.as_bytes())
            .map_err(|e| ContextError::InvalidBase64 {
                reason: e.to_string(),
            })?;

        let text = String::from_utf8(bytes).map_err(|_| ContextError::InvalidUtf8)?;

        let value: Value = serde_json::from_str(&text).map_err(|e| ContextError::InvalidJson {
            reason: e.to_string(),
        })?;

        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value as a login context.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NotAnObject`] or [`ContextError::ReservedKey`].
    pub fn from_value(value: Value) -> Result<Self, ContextError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ContextError::NotAnObject {
                    kind: json_kind(&other),
                });
            }
        };

        if let Some(key) = RESERVED_KEYS.iter().find(|k| map.contains_key(**k)) {
            return Err(ContextError::ReservedKey {
                key: (*key).to_owned(),
            });
        }

        Ok(Self(map))
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
