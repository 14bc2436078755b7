use axum::http::StatusCode;
use std::time::{Duration, Instant};

use super::response::{SearchArguments, SearchFields, SearchPage};
use crate::engine::EngineError;
use crate::models::{
    DirectResult, PaginationWindow, ResponseState, SearchParams, SearchQuery, SearchResult,
};
use crate::state::AppState;

/// Failures that end a search request without results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Tree '{0}' is not a valid tree.")]
    UnknownTree(String),
    #[error("Failed to establish database connection.")]
    ConnectionFailure,
    #[error("Database error: {0}")]
    Engine(String),
    #[error("Search timed out after {0:?}")]
    Timeout(Duration),
    #[error("Search task failed: {0}")]
    TaskFailed(String),
}

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::UnknownTree(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SearchError> for ResponseState {
    fn from(e: SearchError) -> Self {
        ResponseState::Error {
            status: e.status(),
            message: e.to_string(),
        }
    }
}

/// What a search request turns into.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Jump straight to a single hit
    Redirect(String),
    Page(SearchPage),
}

/// Result of the blocking part of a search.
enum Execution {
    Direct(DirectResult),
    Results {
        results: Vec<SearchResult>,
        elapsed: Duration,
    },
    /// The engine rejected the query text; shown to the user, not an error
    Rejected {
        message: String,
        elapsed: Duration,
    },
}

/// Handle `/<tree>/search`: validate the tree, run the query and assemble
/// the format-independent result.
pub async fn run_search(state: &AppState, tree: &str, params: &SearchParams) -> SearchOutcome {
    let site = &state.site;
    let window = PaginationWindow::from_params(params.offset.as_deref(), params.limit.as_deref());
    let mut arguments = SearchArguments::for_site(site);

    if !site.registry.contains(tree) {
        tracing::debug!("Search in unknown tree {tree:?}");
        let unknown = SearchError::UnknownTree(tree.to_string()).into();
        return SearchOutcome::Page(SearchPage::new(unknown, arguments));
    }
    arguments.tree = tree.to_string();

    let query = SearchQuery::from_params(params);
    let execution = execute(state, tree, &query, window, params.wants_redirect()).await;

    let (response_state, results, elapsed) = match execution {
        Ok(Execution::Direct(hit)) => {
            return SearchOutcome::Redirect(direct_url(state, tree, &query, &hit));
        }
        Ok(Execution::Results { results, elapsed }) => (ResponseState::Success, results, elapsed),
        Ok(Execution::Rejected { message, elapsed }) => {
            (ResponseState::Warning(message), Vec::new(), elapsed)
        }
        Err(e) => {
            tracing::error!("Search in {tree} failed: {e}");
            return SearchOutcome::Page(SearchPage::new(e.into(), arguments));
        }
    };

    arguments.search = Some(SearchFields {
        time: elapsed.as_secs_f64(),
        search_url: site.search_url(tree, &query.text, false),
        query: query.text,
        results,
        offset: window.offset,
        limit: window.limit,
        is_case_sensitive: query.case_sensitive,
    });
    SearchOutcome::Page(SearchPage::new(response_state, arguments))
}

/// Connect and query on a blocking thread, bounded by the search timeout.
async fn execute(
    state: &AppState,
    tree: &str,
    query: &SearchQuery,
    window: PaginationWindow,
    try_direct: bool,
) -> Result<Execution, SearchError> {
    let backend = state.backend.clone();
    let instance_dir = state.site.instance_dir.clone();
    let tree = tree.to_string();
    let query = query.clone();

    let task = tokio::task::spawn_blocking(move || -> Result<Execution, SearchError> {
        let connection = backend
            .connect(&tree, &instance_dir)
            .ok_or(SearchError::ConnectionFailure)?;
        let prepared = connection.prepare(&query);

        if try_direct {
            match prepared.direct_result() {
                Ok(Some(hit)) => return Ok(Execution::Direct(hit)),
                Ok(None) => {}
                // The full search below reports the same failure
                Err(e) => tracing::debug!("Direct lookup in {tree} failed: {e}"),
            }
        }

        let start = Instant::now();
        let outcome = prepared.results(window);
        let elapsed = start.elapsed();

        match outcome {
            Ok(results) => Ok(Execution::Results { results, elapsed }),
            Err(EngineError::Regex(message)) | Err(EngineError::Syntax(message)) => {
                tracing::warn!("Rejected query {:?} in {tree}: {message}", query.text);
                Ok(Execution::Rejected { message, elapsed })
            }
            Err(EngineError::Other(message)) => Err(SearchError::Engine(message)),
        }
    });

    match tokio::time::timeout(state.search_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(SearchError::TaskFailed(e.to_string())),
        Err(_) => Err(SearchError::Timeout(state.search_timeout)),
    }
}

/// Browse URL of a direct hit, keeping the query so the page can highlight it.
fn direct_url(state: &AppState, tree: &str, query: &SearchQuery, hit: &DirectResult) -> String {
    format!(
        "{}?from={}{}#{}",
        state.site.browse_url(tree, &hit.path),
        urlencoding::encode(&query.text),
        if query.case_sensitive { "&case=true" } else { "" },
        hit.line
    )
}
