use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::{found, not_found};
use crate::browse;
use crate::state::AppState;

/// GET / - Redirect to the default tree
pub async fn index(State(state): State<AppState>) -> Response {
    match state.site.registry.default_tree() {
        Some(tree) => found(&state.site.browse_url(&tree.name, "")),
        None => not_found("No trees configured"),
    }
}

/// GET /{tree} and /{tree}/ - Redirect into the tree's browse root
pub async fn tree_root(State(state): State<AppState>, Path(tree): Path<String>) -> Response {
    if !state.site.registry.contains(&tree) {
        return unknown_tree(&tree);
    }
    found(&state.site.browse_url(&tree, ""))
}

/// GET /{tree}/source/
pub async fn source_root(State(state): State<AppState>, Path(tree): Path<String>) -> Response {
    serve_artifact(&state, &tree, "").await
}

/// GET /{tree}/source/{*path} - Serve the rendered page of a file or directory
pub async fn source(
    State(state): State<AppState>,
    Path((tree, path)): Path<(String, String)>,
) -> Response {
    serve_artifact(&state, &tree, &path).await
}

/// GET /{tree}/parallel/
pub async fn parallel_root(State(state): State<AppState>, Path(tree): Path<String>) -> Response {
    redirect_parallel(&state, &tree, "")
}

/// GET /{tree}/parallel/{*path} - Switch to `tree`, staying on `path` if it
/// was rendered there
pub async fn parallel(
    State(state): State<AppState>,
    Path((tree, path)): Path<(String, String)>,
) -> Response {
    redirect_parallel(&state, &tree, &path)
}

async fn serve_artifact(state: &AppState, tree: &str, path: &str) -> Response {
    let Some(tree_config) = state.site.registry.get(tree) else {
        return unknown_tree(tree);
    };
    let Some(artifact) = browse::resolve(&state.site, tree_config, path) else {
        return not_found("Not found");
    };

    match tokio::fs::read(&artifact).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::debug!("No artifact at {}: {e}", artifact.display());
            not_found("Not found")
        }
    }
}

fn redirect_parallel(state: &AppState, tree: &str, path: &str) -> Response {
    let Some(target) = state.site.registry.get(tree) else {
        return unknown_tree(tree);
    };
    found(&browse::parallel_url(&state.site, target, path))
}

fn unknown_tree(tree: &str) -> Response {
    not_found(format!("Tree '{tree}' is not a valid tree."))
}
