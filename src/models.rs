use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OFFSET: usize = 0;
pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

/// Raw query-string parameters of a search request. Everything stays a string
/// so malformed numbers fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub case: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub explain: Option<String>,
    pub redirect: Option<String>,
    pub format: Option<String>,
}

impl SearchParams {
    pub fn wants_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }

    pub fn wants_redirect(&self) -> bool {
        self.redirect.as_deref() == Some("true")
    }
}

/// What to search for, built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub case_sensitive: bool,
    /// Ask the engine to report how it ran the query
    pub explain: bool,
}

impl SearchQuery {
    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            text: params.q.clone().unwrap_or_default(),
            case_sensitive: params.case.as_deref() == Some("true"),
            explain: params.explain.is_some(),
        }
    }
}

/// Which slice of the ranked results to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationWindow {
    pub offset: usize,
    pub limit: usize,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PaginationWindow {
    pub fn from_params(offset: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            offset: non_negative_int(offset, DEFAULT_OFFSET),
            limit: non_negative_int(limit, DEFAULT_LIMIT).min(MAX_LIMIT),
        }
    }
}

/// Parse a non-negative integer, falling back to `default` on anything else.
pub fn non_negative_int(s: Option<&str>, default: usize) -> usize {
    s.and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(default)
}

/// A single matching line inside a result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMatch {
    /// 1-based
    pub line_number: usize,
    pub line: String,
}

/// One file in a result page, with its matching lines in engine order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub icon: String,
    /// Relative to the tree root
    pub path: String,
    pub lines: Vec<LineMatch>,
}

/// An unambiguous hit the caller can be redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectResult {
    pub path: String,
    pub line: usize,
}

/// How a request ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseState {
    Success,
    /// Recoverable: shown inline next to an empty result list
    Warning(String),
    Error { message: String, status: StatusCode },
}

impl ResponseState {
    pub fn message(&self) -> Option<&str> {
        match self {
            ResponseState::Success => None,
            ResponseState::Warning(message) => Some(message.as_str()),
            ResponseState::Error { message, .. } => Some(message.as_str()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseState::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_when_absent() {
        let window = PaginationWindow::from_params(None, None);
        assert_eq!(window, PaginationWindow { offset: 0, limit: 100 });
    }

    #[test]
    fn test_negative_and_garbage_offsets_fall_back() {
        assert_eq!(PaginationWindow::from_params(Some("-5"), None).offset, 0);
        assert_eq!(PaginationWindow::from_params(Some("abc"), None).offset, 0);
        assert_eq!(PaginationWindow::from_params(Some("1.5"), None).offset, 0);
        assert_eq!(PaginationWindow::from_params(Some("40"), None).offset, 40);
    }

    #[test]
    fn test_limit_is_capped() {
        assert_eq!(PaginationWindow::from_params(None, Some("5000")).limit, 1000);
        assert_eq!(PaginationWindow::from_params(None, Some("1000")).limit, 1000);
        assert_eq!(PaginationWindow::from_params(None, Some("0")).limit, 0);
        assert_eq!(PaginationWindow::from_params(None, Some("-1")).limit, 100);
        assert_eq!(PaginationWindow::from_params(None, Some("")).limit, 100);
    }

    #[test]
    fn test_case_flag_requires_literal_true() {
        let mut params = SearchParams {
            case: Some("true".to_string()),
            ..Default::default()
        };
        assert!(SearchQuery::from_params(&params).case_sensitive);

        for other in ["True", "1", "yes", ""] {
            params.case = Some(other.to_string());
            assert!(!SearchQuery::from_params(&params).case_sensitive, "{other}");
        }
        params.case = None;
        assert!(!SearchQuery::from_params(&params).case_sensitive);
    }

    #[test]
    fn test_explain_is_presence_only() {
        let params = SearchParams {
            explain: Some(String::new()),
            ..Default::default()
        };
        assert!(SearchQuery::from_params(&params).explain);
        assert!(!SearchQuery::from_params(&SearchParams::default()).explain);
    }

    #[test]
    fn test_search_result_serializes_as_keyed_record() {
        let result = SearchResult {
            icon: "rust".to_string(),
            path: "src/lib.rs".to_string(),
            lines: vec![LineMatch {
                line_number: 3,
                line: "fn main() {}".to_string(),
            }],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "icon": "rust",
                "path": "src/lib.rs",
                "lines": [{"line_number": 3, "line": "fn main() {}"}]
            })
        );
    }
}
