//! Core library for the `Miraxr` login front end.
//!
//! Everything that does not depend on HTTP lives here: decoding the login
//! context header, negotiating locales, translation catalogs, resolving EULA
//! documents from disk, and rendering pages through the shared template
//! environment.

pub mod context;
pub mod error;
pub mod eula;
pub mod i18n;
pub mod locale;
pub mod markdown;
pub mod render;

/// Whether `segment` is a plain file or directory name.
///
/// Rejects empty strings, `.` and `..`, and anything containing a path
/// separator or NUL, so the segment can be joined onto a root directory
/// without escaping it.
#[must_use]
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}
