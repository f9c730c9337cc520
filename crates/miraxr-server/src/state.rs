//! Shared application state for `Miraxr` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. Everything in it is read-only after construction:
//! the template renderer (which owns the translation catalog), the locale
//! negotiator and the EULA store.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use miraxr_core::eula::EulaStore;
use miraxr_core::i18n::Catalog;
use miraxr_core::locale::{Locale, LocaleNegotiator};
use miraxr_core::render::Renderer;

use crate::config::{ContentPaths, ServerConfig};

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Template environment with partials and translation helpers.
    pub renderer: Renderer,
    /// Picks the active locale per request.
    pub negotiator: LocaleNegotiator,
    /// EULA documents on disk.
    pub eulas: EulaStore,
    /// Route prefix, normalized.
    pub base_path: String,
    /// On-disk layout.
    pub paths: ContentPaths,
}

impl AppState {
    /// Load catalogs and build the renderer from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the default locale is invalid or the translation catalogs
    /// cannot be loaded.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let default = Locale::parse(&config.default_locale)
            .context("MIRAXR_DEFAULT_LOCALE is not a valid locale code")?;

        let catalog = Arc::new(
            Catalog::load(&config.paths.translations, &default)
                .context("failed to load translation catalogs")?,
        );
        let negotiator = LocaleNegotiator::new(catalog.locales(), default);

        let renderer = Renderer::new(
            config.paths.views.clone(),
            config.paths.partial_roots(),
            catalog,
        );
        info!(
            views = %renderer.views().display(),
            partials = ?renderer.partials(),
            "template renderer ready"
        );

        Ok(Self {
            renderer,
            negotiator,
            eulas: EulaStore::new(&config.paths.eulas),
            base_path: config.base_path.clone(),
            paths: config.paths.clone(),
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}
