use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use super::found;
use crate::models::SearchParams;
use crate::search::{run_search, SearchOutcome};
use crate::state::AppState;

/// GET /{tree}/search - Run a query and answer with a page, a JSON payload
/// (`format=json`), or a redirect to a single hit (`redirect=true`).
pub async fn search(
    State(state): State<AppState>,
    Path(tree): Path<String>,
    Query(params): Query<SearchParams>,
) -> Response {
    match run_search(&state, &tree, &params).await {
        SearchOutcome::Redirect(location) => found(&location),
        SearchOutcome::Page(page) if params.wants_json() => {
            let (status, body) = page.to_json();
            (status, Json(body)).into_response()
        }
        SearchOutcome::Page(page) => {
            let (status, html) = page.render_html(state.renderer.as_ref());
            (status, Html(html)).into_response()
        }
    }
}
