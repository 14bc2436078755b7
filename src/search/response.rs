//! The per-request search result and its two encodings: the JSON payload and
//! the rendered page. Both are pure functions of a [`SearchPage`].

use axum::http::StatusCode;
use serde::Serialize;

use crate::models::{ResponseState, SearchResult};
use crate::render::{PageRenderer, View};
use crate::site::Site;

/// Everything a view or payload gets to see.
#[derive(Debug, Clone, Serialize)]
pub struct SearchArguments {
    pub wwwroot: String,
    pub tree: String,
    pub trees: Vec<String>,
    /// Site-wide template parameters
    pub config: serde_json::Map<String, serde_json::Value>,
    pub generated_date: String,
    /// Present once a search actually ran
    #[serde(flatten)]
    pub search: Option<SearchFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchFields {
    /// Seconds spent in the engine
    pub time: f64,
    pub query: String,
    pub search_url: String,
    pub results: Vec<SearchResult>,
    pub offset: usize,
    pub limit: usize,
    pub is_case_sensitive: bool,
}

impl SearchArguments {
    /// Site-wide arguments, pointing at the default tree.
    pub fn for_site(site: &Site) -> Self {
        Self {
            wwwroot: site.www_root.clone(),
            tree: site
                .registry
                .default_tree()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            trees: site.registry.names(),
            config: site.template_parameters.clone(),
            generated_date: site.generated_date.clone(),
            search: None,
            error: None,
        }
    }
}

/// Outcome of one search request, before it is encoded.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub state: ResponseState,
    pub arguments: SearchArguments,
}

impl SearchPage {
    pub fn new(state: ResponseState, mut arguments: SearchArguments) -> Self {
        arguments.error = state.message().map(str::to_string);
        if state.is_error() {
            arguments.search = None;
        }
        Self { state, arguments }
    }

    /// Status code of the response in either format.
    pub fn status(&self) -> StatusCode {
        match &self.state {
            ResponseState::Error { status, .. } => *status,
            ResponseState::Success | ResponseState::Warning(_) => StatusCode::OK,
        }
    }

    pub fn to_json(&self) -> (StatusCode, serde_json::Value) {
        let body = serde_json::to_value(&self.arguments).unwrap_or_else(|e| {
            tracing::error!("Failed to encode search arguments: {e}");
            serde_json::Value::Null
        });
        (self.status(), body)
    }

    pub fn render_html(&self, renderer: &dyn PageRenderer) -> (StatusCode, String) {
        let view = if self.state.is_error() {
            View::Error
        } else {
            View::Search
        };
        (self.status(), renderer.render(view, &self.arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineMatch;

    fn arguments() -> SearchArguments {
        SearchArguments {
            wwwroot: String::new(),
            tree: "central".to_string(),
            trees: vec!["central".to_string()],
            config: serde_json::Map::new(),
            generated_date: "today".to_string(),
            search: None,
            error: None,
        }
    }

    fn fields(results: Vec<SearchResult>) -> SearchFields {
        SearchFields {
            time: 0.25,
            query: "main".to_string(),
            search_url: "/central/search?q=main&redirect=false".to_string(),
            results,
            offset: 0,
            limit: 100,
            is_case_sensitive: false,
        }
    }

    #[test]
    fn test_success_payload_is_flat_with_results() {
        let mut args = arguments();
        args.search = Some(fields(vec![SearchResult {
            icon: "mimetypes/rs".to_string(),
            path: "main.rs".to_string(),
            lines: vec![LineMatch {
                line_number: 1,
                line: "fn main() {}".to_string(),
            }],
        }]));
        let (status, body) = SearchPage::new(ResponseState::Success, args).to_json();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tree"], "central");
        assert_eq!(body["query"], "main");
        assert_eq!(body["results"][0]["lines"][0]["line_number"], 1);
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_error_payload_drops_search_fields() {
        let mut args = arguments();
        args.search = Some(fields(Vec::new()));
        let page = SearchPage::new(
            ResponseState::Error {
                message: "Database error: boom".to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            },
            args,
        );
        let (status, body) = page.to_json();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("results").is_none());
        assert!(body.get("query").is_none());
        assert_eq!(body["error"], "Database error: boom");
    }

    #[test]
    fn test_warning_keeps_ok_status() {
        let mut args = arguments();
        args.search = Some(fields(Vec::new()));
        let page = SearchPage::new(ResponseState::Warning("bad regex".to_string()), args);

        assert_eq!(page.status(), StatusCode::OK);
        let (_, body) = page.to_json();
        assert_eq!(body["error"], "bad regex");
        assert_eq!(body["results"], serde_json::json!([]));
    }
}
