//! Static responder for the local images directory

use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::Response,
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

pub const ONE_YEAR_MS: u64 = 31_536_000_000;

/// HTTP `max-age` is expressed in seconds.
pub const ONE_YEAR_SECS: u64 = ONE_YEAR_MS / 1000;

/// Must agree with [`ONE_YEAR_SECS`].
const CACHE_CONTROL_ONE_YEAR: &str = "public, max-age=31536000";

/// Serve files under `dir`, marking successful responses cacheable for a year.
///
/// Conditional and range requests are left to [`ServeDir`].
pub fn static_images(dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(middleware::map_response(set_cache_control))
}

async fn set_cache_control(mut response: Response) -> Response {
    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_ONE_YEAR),
        );
    }
    response
}
