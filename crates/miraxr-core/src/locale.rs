//! Locale codes and per-request locale negotiation.
//!
//! A locale is a code such as `en_US`. The set of supported locales is the set
//! of translation catalogs loaded at startup; negotiation only ever yields a
//! supported locale, so the code is safe to use as a file name when selecting
//! an EULA body.

use std::fmt;

use serde::Serialize;

use crate::error::LocaleError;

/// Name of the cookie carrying the user's chosen locale.
pub const COOKIE_NAME: &str = "dana-locale";

/// Name of the query parameter that overrides the locale for one request.
pub const QUERY_PARAM: &str = "locale";

/// Locale used when nothing else is configured.
pub const DEFAULT_LOCALE: &str = "en_US";

/// A validated, canonical locale code (`ll` or `ll_RR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Parse and canonicalize a locale code.
    ///
    /// Accepts `-` or `_` as the separator. The language subtag is lowercased
    /// and a two-letter region is uppercased, so `en-us` becomes `en_US`.
    ///
    /// # Errors
    ///
    /// Returns [`LocaleError::Invalid`] unless the code is a 2-3 letter
    /// language optionally followed by one 2-8 character alphanumeric subtag.
    pub fn parse(code: &str) -> Result<Self, LocaleError> {
        let invalid = || LocaleError::Invalid {
            code: code.to_owned(),
        };

        let code = code.trim();
        let mut parts = code.split(['_', '-']);
        let language = parts.next().ok_or_else(invalid)?;
        let region = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if !(2..=3).contains(&language.len()) || !language.bytes().all(|b| b.is_ascii_alphabetic())
        {
            return Err(invalid());
        }

        let mut canonical = language.to_ascii_lowercase();
        if let Some(region) = region {
            if !(2..=8).contains(&region.len())
                || !region.bytes().all(|b| b.is_ascii_alphanumeric())
            {
                return Err(invalid());
            }
            canonical.push('_');
            if region.len() == 2 {
                canonical.push_str(&region.to_ascii_uppercase());
            } else {
                canonical.push_str(region);
            }
        }

        Ok(Self(canonical))
    }

    /// The canonical code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The language subtag (`en` for `en_US`).
    #[must_use]
    pub fn language(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw locale hints taken from one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleSources<'a> {
    /// Value of the `locale` query parameter.
    pub query: Option<&'a str>,
    /// Value of the `dana-locale` cookie.
    pub cookie: Option<&'a str>,
    /// Raw `Accept-Language` header.
    pub accept_language: Option<&'a str>,
}

/// Picks the active locale for a request from a fixed supported set.
#[derive(Debug, Clone)]
pub struct LocaleNegotiator {
    supported: Vec<Locale>,
    default: Locale,
}

impl LocaleNegotiator {
    /// Build a negotiator. The default is added to the supported set if absent.
    #[must_use]
    pub fn new(mut supported: Vec<Locale>, default: Locale) -> Self {
        if !supported.contains(&default) {
            supported.push(default.clone());
        }
        supported.sort();
        supported.dedup();
        Self { supported, default }
    }

    /// Negotiate the active locale.
    ///
    /// Sources are tried in order: query parameter, cookie, `Accept-Language`.
    /// A source is used only if it names a supported locale; otherwise the
    /// next one is tried, ending at the default.
    #[must_use]
    pub fn negotiate(&self, sources: &LocaleSources<'_>) -> Locale {
        sources
            .query
            .and_then(|q| self.exact(q))
            .or_else(|| sources.cookie.and_then(|c| self.exact(c)))
            .or_else(|| sources.accept_language.and_then(|h| self.match_accept_language(h)))
            .unwrap_or_else(|| self.default.clone())
    }

    fn exact(&self, code: &str) -> Option<Locale> {
        let locale = Locale::parse(code).ok()?;
        self.supported.contains(&locale).then_some(locale)
    }

    /// Match an `Accept-Language` header against the supported set.
    ///
    /// Tags are ranked by `q` weight (ties keep header order). For each tag an
    /// exact match wins; otherwise the first supported locale with the same
    /// language is taken.
    fn match_accept_language(&self, header: &str) -> Option<Locale> {
        let mut ranked: Vec<(Locale, f32)> = header
            .split(',')
            .filter_map(|entry| {
                let mut pieces = entry.split(';');
                let tag = pieces.next()?.trim();
                let weight = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                if weight <= 0.0 {
                    return None;
                }
                Locale::parse(tag).ok().map(|l| (l, weight))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranked.into_iter().find_map(|(wanted, _)| {
            if self.supported.contains(&wanted) {
                return Some(wanted);
            }
            self.supported
                .iter()
                .find(|s| s.language() == wanted.language())
                .cloned()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn locale(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn negotiator() -> LocaleNegotiator {
        LocaleNegotiator::new(vec![locale("de_DE"), locale("fr_FR")], locale("en_US"))
    }

    #[test]
    fn parse_canonicalizes() {
        assert_eq!(locale("en-us").as_str(), "en_US");
        assert_eq!(locale("DE_de").as_str(), "de_DE");
        assert_eq!(locale("fr").as_str(), "fr");
        assert_eq!(locale("es_419").as_str(), "es_419");
    }

    #[test]
    fn parse_rejects_path_like_codes() {
        for code in ["", "../etc", "en_US/../x", "e", "english", "en_US_x", "en_U$"] {
            assert!(Locale::parse(code).is_err(), "{code} should be rejected");
        }
    }

    #[test]
    fn default_is_always_supported() {
        let n = negotiator();
        let sources = LocaleSources {
            query: Some("en_US"),
            cookie: Some("de_DE"),
            accept_language: None,
        };
        assert_eq!(n.negotiate(&sources), locale("en_US"));
    }

    #[test]
    fn no_sources_yields_default() {
        let n = negotiator();
        assert_eq!(n.negotiate(&LocaleSources::default()), locale("en_US"));
    }

    #[test]
    fn query_beats_cookie() {
        let n = negotiator();
        let sources = LocaleSources {
            query: Some("fr_FR"),
            cookie: Some("de_DE"),
            accept_language: None,
        };
        assert_eq!(n.negotiate(&sources), locale("fr_FR"));
    }

    #[test]
    fn cookie_beats_accept_language() {
        let n = negotiator();
        let sources = LocaleSources {
            query: None,
            cookie: Some("de_DE"),
            accept_language: Some("fr-FR"),
        };
        assert_eq!(n.negotiate(&sources), locale("de_DE"));
    }

    #[test]
    fn unsupported_cookie_falls_through() {
        let n = negotiator();
        let sources = LocaleSources {
            query: None,
            cookie: Some("ja_JP"),
            accept_language: None,
        };
        assert_eq!(n.negotiate(&sources), locale("en_US"));
    }

    #[test]
    fn accept_language_honours_weights_and_language_match() {
        let n = negotiator();
        let sources = LocaleSources {
            query: None,
            cookie: None,
            accept_language: Some("ja;q=0.9, fr-CA;q=0.8, de;q=0.5"),
        };
        // ja is unsupported; fr-CA has no exact match but shares a language with fr_FR.
        assert_eq!(n.negotiate(&sources), locale("fr_FR"));
    }

    #[test]
    fn accept_language_skips_zero_weight() {
        let n = negotiator();
        let sources = LocaleSources {
            query: None,
            cookie: None,
            accept_language: Some("de-DE;q=0, *;q=0.1"),
        };
        assert_eq!(n.negotiate(&sources), locale("en_US"));
    }
}
