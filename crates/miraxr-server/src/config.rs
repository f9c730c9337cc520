//! Server configuration for `Miraxr`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Every on-disk location is derived from one root directory, so a checkout
//! with `views/`, `partials/`, `assets/` and `eulas/` runs with no settings.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use miraxr_core::locale::DEFAULT_LOCALE;

/// Vendored SDK package, relative to the vendor directory.
pub const SDK_PACKAGE: &str = "@auditmation/dana-login-sdk";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Prefix prepended to every page and asset route (`""` or `/login`).
    pub base_path: String,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Locale used when negotiation finds nothing supported.
    pub default_locale: String,
    /// On-disk layout.
    pub paths: ContentPaths,
}

/// Directories the server reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPaths {
    /// Page templates (`login.html`, `eula.html`, ...).
    pub views: PathBuf,
    /// Local partials, searched before the SDK's.
    pub partials: PathBuf,
    /// Local static assets.
    pub assets: PathBuf,
    /// Translation catalogs, one `<locale>.json` per locale.
    pub translations: PathBuf,
    /// EULA documents, one directory per id.
    pub eulas: PathBuf,
    /// Favicon served at `/favicon.png`.
    pub favicon: PathBuf,
    /// Vendored dependencies, served at `/assets/lib`.
    pub vendor: PathBuf,
    /// The vendored login SDK's `assets/` directory.
    pub sdk_assets: PathBuf,
    /// The vendored login SDK's partials.
    pub sdk_partials: PathBuf,
}

impl ContentPaths {
    /// Standard layout under `root`, with vendored packages in
    /// `<root>/node_modules` unless `vendor` is given.
    #[must_use]
    pub fn under(root: &Path, vendor: Option<PathBuf>, sdk: Option<PathBuf>) -> Self {
        let assets = root.join("assets");
        let vendor = vendor.unwrap_or_else(|| root.join("node_modules"));
        let sdk_assets = sdk.unwrap_or_else(|| vendor.join(SDK_PACKAGE).join("assets"));
        Self {
            views: root.join("views"),
            partials: root.join("partials"),
            translations: assets.join("translations"),
            favicon: assets.join("images").join("favicon.png"),
            assets,
            eulas: root.join("eulas"),
            sdk_partials: sdk_assets.join("partials"),
            sdk_assets,
            vendor,
        }
    }

    /// Partial search roots, highest priority first.
    #[must_use]
    pub fn partial_roots(&self) -> Vec<PathBuf> {
        vec![self.partials.clone(), self.sdk_partials.clone()]
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (binds to `0.0.0.0`)
    /// - `MIRAXR_BIND_ADDR` — full bind address (overrides `PORT`, default: `0.0.0.0:3001`)
    /// - `LOGIN_BASE_PATH` — route prefix (default: empty)
    /// - `MIRAXR_ROOT` — content root directory (default: `.`)
    /// - `MIRAXR_VENDOR_DIR` — vendored packages (default: `<root>/node_modules`)
    /// - `MIRAXR_SDK_DIR` — login SDK assets (default: `<vendor>/@auditmation/dana-login-sdk/assets`)
    /// - `MIRAXR_DEFAULT_LOCALE` — fallback locale (default: `en_US`)
    /// - `MIRAXR_LOG_LEVEL` — log filter (default: `info`)
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = if let Ok(addr) = std::env::var("MIRAXR_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3001)))
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(3001);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([0, 0, 0, 0], 3001))
        };

        let base_path = normalize_base_path(&std::env::var("LOGIN_BASE_PATH").unwrap_or_default());

        let root = std::env::var("MIRAXR_ROOT").map_or_else(|_| PathBuf::from("."), PathBuf::from);
        let vendor = std::env::var("MIRAXR_VENDOR_DIR").ok().map(PathBuf::from);
        let sdk = std::env::var("MIRAXR_SDK_DIR").ok().map(PathBuf::from);

        let default_locale = std::env::var("MIRAXR_DEFAULT_LOCALE")
            .unwrap_or_else(|_| DEFAULT_LOCALE.to_owned());

        let log_level = std::env::var("MIRAXR_LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_owned());

        Self {
            bind_addr,
            base_path,
            log_level,
            default_locale,
            paths: ContentPaths::under(&root, vendor, sdk),
        }
    }

    /// Defaults rooted at `root`, for embedding and tests.
    #[must_use]
    pub fn for_root(root: &Path) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            base_path: String::new(),
            log_level: "info".to_owned(),
            default_locale: DEFAULT_LOCALE.to_owned(),
            paths: ContentPaths::under(root, None, None),
        }
    }

    /// Replace the base path, normalizing it.
    #[must_use]
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }
}

/// Normalize a route prefix to `""` or `/segment[/segment...]`.
///
/// Surrounding whitespace and trailing slashes are dropped and a leading slash
/// is added, so `login/`, `/login` and `/login/` all become `/login`.
#[must_use]
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
