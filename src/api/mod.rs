//! Axum handlers and the route table.

pub mod browse;
pub mod search;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(browse::index))
        .route("/{tree}", get(browse::tree_root))
        .route("/{tree}/", get(browse::tree_root))
        .route("/{tree}/search", get(search::search))
        .route("/{tree}/source/", get(browse::source_root))
        .route("/{tree}/source/{*path}", get(browse::source))
        .route("/{tree}/parallel/", get(browse::parallel_root))
        .route("/{tree}/parallel/{*path}", get(browse::parallel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 302 to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub(crate) fn not_found(message: impl Into<String>) -> Response {
    (StatusCode::NOT_FOUND, message.into()).into_response()
}
