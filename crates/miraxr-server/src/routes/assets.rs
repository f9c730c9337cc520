//! Static asset routes.
//!
//! - `/{domain}/favicon.png` serves `assets/images/favicon.png`.
//! - `/{domain}/assets/lib/{*path}` serves the vendored dependency directory.
//!   TypeScript and CommonJS sources are labelled `application/javascript`
//!   so browsers accept them as module scripts. A miss there falls through
//!   to the general asset lookup below.
//! - `/{domain}/assets/{*path}` serves local assets, then the login SDK's.
//! - `/assets/translations/{file}` serves the catalogs outside the base path,
//!   where the browser i18n shim fetches them (`mode: cors`, so the route
//!   answers any origin).

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes, HttpBody};
use axum::extract::{Path, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, StatusCode, Uri, header};
use axum::response::Response;
use axum::routing::get;
use axum::{BoxError, Router};
use tower::{Service, ServiceExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use miraxr_core::is_safe_segment;

use crate::error::AppError;
use crate::state::AppState;

/// Sub-path of the assets mount that maps to the vendor directory.
const LIB_PREFIX: &str = "lib/";

/// Extensions served as JavaScript from the vendor directory.
const SCRIPT_EXTENSIONS: &[&str] = &[".ts", ".cjs"];

/// Build the asset router for `base_path` (already normalized).
pub fn router(base_path: &str) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let translations = Router::new()
        .route("/assets/translations/{file}", get(translation))
        .layer(cors);

    Router::new()
        .route(&format!("{base_path}/{{domain}}/favicon.png"), get(favicon))
        .route(&format!("{base_path}/{{domain}}/assets/{{*path}}"), get(asset))
        .merge(translations)
}

async fn favicon(State(state): State<Arc<AppState>>, req: Request) -> Response {
    serve(ServeFile::new(&state.paths.favicon), req).await
}

async fn asset(
    State(state): State<Arc<AppState>>,
    Path((_domain, path)): Path<(String, String)>,
    req: Request,
) -> Result<Response, AppError> {
    let (parts, _body) = req.into_parts();

    if let Some(lib_path) = path.strip_prefix(LIB_PREFIX) {
        let vendor_req = file_request(&parts, lib_path)?;
        let mut res = serve(ServeDir::new(&state.paths.vendor), vendor_req).await;
        if res.status() != StatusCode::NOT_FOUND {
            if res.status().is_success() && is_script(lib_path) {
                res.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/javascript"),
                );
            }
            return Ok(res);
        }
    }

    let local_then_sdk =
        ServeDir::new(&state.paths.assets).fallback(ServeDir::new(&state.paths.sdk_assets));
    let req = file_request(&parts, &path)?;
    Ok(serve(local_then_sdk, req).await)
}

async fn translation(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    req: Request,
) -> Result<Response, AppError> {
    if !is_safe_segment(&file) {
        return Err(AppError::NotFound(format!("translation '{file}' not found")));
    }
    let (parts, _body) = req.into_parts();
    let req = file_request(&parts, &file)?;
    Ok(serve(ServeDir::new(&state.paths.translations), req).await)
}

fn is_script(path: &str) -> bool {
    SCRIPT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// A body-less request like `parts` pointed at `/{path}`, so a file service
/// resolves it from its root. Method and headers (ranges, conditionals,
/// encodings) carry over.
///
/// Segments are re-encoded because the router hands out decoded paths.
fn file_request(parts: &Parts, path: &str) -> Result<Request, AppError> {
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    let uri: Uri = format!("/{}", encoded.join("/"))
        .parse()
        .map_err(|_| AppError::NotFound(format!("asset '{path}' not found")))?;

    let mut out = Request::new(Body::empty());
    *out.method_mut() = parts.method.clone();
    *out.uri_mut() = uri;
    *out.headers_mut() = parts.headers.clone();
    Ok(out)
}

async fn serve<S, B>(service: S, req: Request) -> Response
where
    S: Service<Request, Response = axum::http::Response<B>, Error = Infallible>,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    match service.oneshot(req).await {
        Ok(res) => res.map(Body::new),
        Err(never) => match never {},
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn script_detection() {
        assert!(is_script("pkg/index.ts"));
        assert!(is_script("pkg/dist/index.cjs"));
        assert!(!is_script("pkg/index.js"));
        assert!(!is_script("pkg/fonts"));
    }

    #[test]
    fn file_request_encodes_segments_and_keeps_headers() {
        let req = axum::http::Request::builder()
            .method(Method::HEAD)
            .uri("/acme/assets/css/my%20file.css")
            .header(header::RANGE, "bytes=0-9")
            .body(Body::empty())
            .unwrap();
        let (parts, _body) = req.into_parts();

        let out = file_request(&parts, "css/my file.css").unwrap();
        assert_eq!(out.uri().path(), "/css/my%20file.css");
        assert_eq!(*out.method(), Method::HEAD);
        assert_eq!(out.headers()[header::RANGE], "bytes=0-9");
    }
}
