//! `Miraxr` HTTP server.
//!
//! Wires the core library into a running Axum server: localized login and
//! EULA pages under a tenant-scoped base path, plus the static asset mounts
//! the pages load from.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
