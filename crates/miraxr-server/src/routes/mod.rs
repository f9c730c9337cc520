//! HTTP routes for `Miraxr`.

pub mod assets;
pub mod pages;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::middleware as axum_mw;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{locale_middleware, login_context_middleware, request_log_middleware};
use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let base_path = state.base_path.clone();

    // Layers run bottom-up: locale first, then the login context.
    let pages = pages::router(&base_path)
        .route_layer(axum_mw::from_fn(login_context_middleware))
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            locale_middleware,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .merge(pages)
        .merge(assets::router(&base_path))
        .layer(axum_mw::from_fn(request_log_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}
