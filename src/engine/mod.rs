//! Seam between the request pipeline and whatever index answers queries.
//!
//! The pipeline only ever talks to these traits: a [`SearchBackend`] hands out
//! a per-request [`IndexConnection`], which builds a [`PreparedQuery`] for one
//! [`SearchQuery`]. [`index::TantivyBackend`] is the bundled implementation.

pub mod index;

use std::path::Path;

use crate::models::{DirectResult, PaginationWindow, SearchQuery, SearchResult};

/// Failure reported by the engine, already sorted into the classes the
/// orchestrator treats differently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Malformed regular expression in the query
    #[error("{0}")]
    Regex(String),
    /// Query text the engine could not parse
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Classify a plain message using the legacy `REGEXP:` / `QUERY:` prefixes.
    /// Only for engines that cannot report a typed error.
    pub fn from_message(message: &str) -> Self {
        if let Some(rest) = message.strip_prefix("REGEXP:") {
            EngineError::Regex(rest.to_string())
        } else if let Some(rest) = message.strip_prefix("QUERY:") {
            EngineError::Syntax(rest.to_string())
        } else {
            EngineError::Other(message.to_string())
        }
    }
}

/// Hands out index connections, one per request.
pub trait SearchBackend: Send + Sync {
    /// Open the index of `tree`. `None` when it cannot be opened.
    fn connect(&self, tree: &str, instance_dir: &Path) -> Option<Box<dyn IndexConnection>>;
}

/// An open handle to one tree's index. Dropped at the end of the request.
pub trait IndexConnection: Send {
    fn prepare<'a>(&'a self, query: &SearchQuery) -> Box<dyn PreparedQuery + 'a>;
}

/// A query bound to a connection.
pub trait PreparedQuery {
    /// The single location this query unambiguously points at, if any.
    fn direct_result(&self) -> Result<Option<DirectResult>, EngineError>;

    /// One page of ranked results.
    fn results(&self, window: PaginationWindow) -> Result<Vec<SearchResult>, EngineError>;
}
