//! Request middleware for `Miraxr`.
//!
//! Page routes run through, in order:
//!
//! 1. [`locale_middleware`] parses the `dana-locale` cookie, the `locale`
//!    query parameter and `Accept-Language`, and injects the negotiated
//!    [`Locale`].
//! 2. [`login_context_middleware`] decodes the `dana-login-context` header
//!    and injects the [`LoginContext`]. A malformed header ends the request
//!    with 400.
//!
//! [`request_log_middleware`] wraps every route, assets included, and logs
//! method, URL and client addresses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::info;

use miraxr_core::context::{HEADER_NAME, LoginContext};
use miraxr_core::locale::{COOKIE_NAME, Locale, LocaleSources, QUERY_PARAM};

use crate::error::AppError;
use crate::state::AppState;

/// Negotiate the request locale and store it in the request extensions.
pub async fn locale_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let query = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(params)| params)
        .unwrap_or_default();
    let cookie = cookie_value(req.headers(), COOKIE_NAME);
    let accept_language = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    let locale: Locale = state.negotiator.negotiate(&LocaleSources {
        query: query.get(QUERY_PARAM).map(String::as_str),
        cookie: cookie.as_deref(),
        accept_language,
    });

    req.extensions_mut().insert(locale);
    next.run(req).await
}

/// Decode the login context header and store it in the request extensions.
pub async fn login_context_middleware(mut req: Request, next: Next) -> Response {
    let header = match req.headers().get(HEADER_NAME).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            return AppError::BadRequest(format!("{HEADER_NAME} header is not ASCII"))
                .into_response();
        }
    };

    match LoginContext::decode(header) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejecting request with invalid login context");
            AppError::from(e).into_response()
        }
    }
}

/// Log method, URL, peer address and the `X-Forwarded-For` chain.
pub async fn request_log_middleware(req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());
    let forwarded = forwarded_for(req.headers());

    info!(
        method = %req.method(),
        uri = %req.uri(),
        peer = peer.as_deref().unwrap_or("-"),
        forwarded = ?forwarded,
        "request"
    );

    next.run(req).await
}

/// Value of cookie `name`, percent-decoded.
///
/// Reads every `Cookie` header; the first matching pair wins. Surrounding
/// double quotes are stripped as in RFC 6265 quoted values.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            urlencoding::decode(value).map_or_else(|_| value.to_owned(), |v| v.into_owned())
        })
}

/// Client addresses from `X-Forwarded-For`, nearest-client first.
#[must_use]
pub fn forwarded_for(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
