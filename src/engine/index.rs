use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, Query, QueryParser};
use tantivy::schema::*;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy};

use super::{EngineError, IndexConnection, PreparedQuery, SearchBackend};
use crate::models::{DirectResult, LineMatch, PaginationWindow, SearchQuery, SearchResult};

/// Prefix marking a query term as a regular expression.
const REGEXP_PREFIX: &str = "regexp:";

/// Where a tree's index lives inside the instance folder.
pub fn index_dir(instance_dir: &Path, tree: &str) -> PathBuf {
    instance_dir.join("indexes").join(tree)
}

/// Connection provider backed by one tantivy index per tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TantivyBackend;

impl SearchBackend for TantivyBackend {
    fn connect(&self, tree: &str, instance_dir: &Path) -> Option<Box<dyn IndexConnection>> {
        let dir = index_dir(instance_dir, tree);
        match TreeIndex::open(&dir) {
            Ok(Some(index)) => Some(Box::new(index)),
            Ok(None) => {
                tracing::warn!("No index for tree {tree} at {}", dir.display());
                None
            }
            Err(e) => {
                tracing::warn!("Failed to open index for tree {tree}: {e:#}");
                None
            }
        }
    }
}

/// A file to add to a tree index.
#[derive(Debug, Clone)]
pub struct IndexedFile {
    pub path: String,
    pub icon: String,
    pub content: String,
}

impl IndexedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let icon = icon_for_path(&path);
        Self {
            path,
            icon,
            content: content.into(),
        }
    }
}

/// Icon name for a file, derived from its extension.
pub fn icon_for_path(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext.is_empty() {
        "mimetypes/unknown".to_string()
    } else {
        format!("mimetypes/{ext}")
    }
}

/// Full-text index of one tree, built on tantivy.
pub struct TreeIndex {
    index: Index,
    reader: IndexReader,
    // Field handles
    f_path: Field,
    f_icon: Field,
    f_content: Field,
}

fn schema() -> (Schema, Field, Field, Field) {
    let mut schema_builder = Schema::builder();
    let f_path = schema_builder.add_text_field("path", STRING | STORED);
    let f_icon = schema_builder.add_text_field("icon", STRING | STORED);
    let f_content = schema_builder.add_text_field("content", TEXT | STORED);
    (schema_builder.build(), f_path, f_icon, f_content)
}

impl TreeIndex {
    /// Open an existing index. `Ok(None)` when there is none at `index_dir`.
    pub fn open(index_dir: &Path) -> Result<Option<Self>> {
        if !index_dir.join("meta.json").exists() {
            return Ok(None);
        }
        let index =
            Index::open_in_dir(index_dir).context("Failed to open existing tantivy index")?;
        Self::from_index(index).map(Some)
    }

    /// Create or open an index at the given directory.
    pub fn open_or_create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;

        let index = if index_dir.join("meta.json").exists() {
            Index::open_in_dir(index_dir).context("Failed to open existing tantivy index")?
        } else {
            let (schema, ..) = schema();
            Index::create_in_dir(index_dir, schema).context("Failed to create tantivy index")?
        };
        Self::from_index(index)
    }

    fn from_index(index: Index) -> Result<Self> {
        let (_, f_path, f_icon, f_content) = schema();
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to create reader")?;

        Ok(Self {
            index,
            reader,
            f_path,
            f_icon,
            f_content,
        })
    }

    /// Add files to the index and commit.
    pub fn index_files(&self, files: &[IndexedFile]) -> Result<()> {
        let mut writer: IndexWriter = self
            .index
            .writer(50_000_000)
            .context("Failed to create index writer")?;

        for file in files {
            writer.add_document(doc!(
                self.f_path => file.path.clone(),
                self.f_icon => file.icon.clone(),
                self.f_content => file.content.clone(),
            ))?;
        }

        writer.commit().context("Failed to commit index")?;
        self.reader.reload().context("Failed to reload reader")?;
        Ok(())
    }

    /// Every file matching `query`, best first, each with its matching lines.
    fn matching_files(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, EngineError> {
        let parsed = ParsedQuery::parse(query)?;

        let tantivy_query: Box<dyn Query> = if !parsed.index_text.is_empty() {
            let query_parser = QueryParser::for_index(&self.index, vec![self.f_content]);
            query_parser
                .parse_query(&parsed.index_text)
                .map_err(|e| EngineError::Syntax(format!("Malformed query: {e}")))?
        } else if !parsed.regexes.is_empty() {
            Box::new(AllQuery)
        } else {
            return Ok(Vec::new());
        };

        if query.explain {
            tracing::info!(
                "Query plan for {:?}: {:?} with {} regex filter(s), {} term filter(s)",
                query.text,
                tantivy_query,
                parsed.regexes.len(),
                parsed.terms.len()
            );
        }

        let searcher = self.reader.searcher();
        let candidate_limit = (searcher.num_docs() as usize).max(1);
        let top_docs = searcher
            .search(&tantivy_query, &TopDocs::with_limit(candidate_limit))
            .map_err(|e| EngineError::Other(format!("Search failed: {e}")))?;

        let mut results = Vec::new();
        for (_score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| EngineError::Other(format!("Failed to retrieve document: {e}")))?;

            let path = doc
                .get_first(self.f_path)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let icon = doc
                .get_first(self.f_icon)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let content = doc
                .get_first(self.f_content)
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            if parsed.has_line_filters() {
                let lines = parsed.matching_lines(content);
                if lines.is_empty() {
                    continue;
                }
                results.push(SearchResult { icon, path, lines });
            } else {
                results.push(SearchResult {
                    icon,
                    path,
                    lines: Vec::new(),
                });
            }
        }

        Ok(results)
    }
}

impl IndexConnection for TreeIndex {
    fn prepare<'a>(&'a self, query: &SearchQuery) -> Box<dyn PreparedQuery + 'a> {
        Box::new(TreeQuery::new(self, query.clone()))
    }
}

/// A query against one index. The matching files are collected on first use
/// and shared by the direct lookup and every results page.
struct TreeQuery<'a> {
    index: &'a TreeIndex,
    query: SearchQuery,
    matches: OnceCell<Result<Vec<SearchResult>, EngineError>>,
}

impl<'a> TreeQuery<'a> {
    fn new(index: &'a TreeIndex, query: SearchQuery) -> Self {
        Self {
            index,
            query,
            matches: OnceCell::new(),
        }
    }

    fn matches(&self) -> Result<&[SearchResult], EngineError> {
        self.matches
            .get_or_init(|| self.index.matching_files(&self.query))
            .as_deref()
            .map_err(Clone::clone)
    }
}

impl PreparedQuery for TreeQuery<'_> {
    fn direct_result(&self) -> Result<Option<DirectResult>, EngineError> {
        let files = self.matches()?;
        match files {
            [only] if only.lines.len() == 1 => Ok(Some(DirectResult {
                path: only.path.clone(),
                line: only.lines[0].line_number,
            })),
            _ => Ok(None),
        }
    }

    fn results(&self, window: PaginationWindow) -> Result<Vec<SearchResult>, EngineError> {
        let files = self.matches()?;
        Ok(files
            .iter()
            .skip(window.offset)
            .take(window.limit)
            .cloned()
            .collect())
    }
}

/// Query text split into what goes to tantivy and what filters lines.
struct ParsedQuery {
    index_text: String,
    regexes: Vec<Regex>,
    terms: Vec<String>,
    case_sensitive: bool,
}

impl ParsedQuery {
    fn parse(query: &SearchQuery) -> Result<Self, EngineError> {
        let mut index_tokens = Vec::new();
        let mut regexes = Vec::new();
        let mut terms = Vec::new();

        for token in query.text.split_whitespace() {
            if let Some(pattern) = token.strip_prefix(REGEXP_PREFIX) {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(!query.case_sensitive)
                    .build()
                    .map_err(|e| EngineError::Regex(format!("Invalid regular expression: {e}")))?;
                regexes.push(regex);
                continue;
            }

            if let Some(piece) = index_token(token) {
                index_tokens.push(piece);
            }
            if let Some(term) = line_term(token) {
                terms.push(if query.case_sensitive {
                    term
                } else {
                    term.to_lowercase()
                });
            }
        }

        Ok(Self {
            index_text: index_tokens.join(" "),
            regexes,
            terms,
            case_sensitive: query.case_sensitive,
        })
    }

    fn has_line_filters(&self) -> bool {
        !self.regexes.is_empty() || !self.terms.is_empty()
    }

    fn matching_lines(&self, content: &str) -> Vec<LineMatch> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| self.line_matches(line))
            .map(|(i, line)| LineMatch {
                line_number: i + 1,
                line: line.to_string(),
            })
            .collect()
    }

    fn line_matches(&self, line: &str) -> bool {
        if !self.regexes.iter().all(|re| re.is_match(line)) {
            return false;
        }
        if self.case_sensitive {
            self.terms.iter().all(|t| line.contains(t.as_str()))
        } else {
            let folded = line.to_lowercase();
            self.terms.iter().all(|t| folded.contains(t.as_str()))
        }
    }
}

fn is_operator(token: &str) -> bool {
    matches!(token, "AND" | "OR" | "NOT")
}

/// `field:value`, as opposed to code like `std::io` or a URL.
fn field_query(token: &str) -> Option<(&str, &str)> {
    let (field, value) = token.split_once(':')?;
    let is_name = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    let is_value = !value.is_empty() && !value.starts_with([':', '/']);
    (is_name && is_value).then_some((field, value))
}

/// Strip quotes and grouping, leaving the text a token stands for.
fn literal(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '(' | ')'))
        .collect()
}

/// How a plain token is handed to the query parser. Operators and field
/// queries pass through untouched; anything else is searched as a phrase so
/// code punctuation never reaches the query grammar.
fn index_token(token: &str) -> Option<String> {
    if is_operator(token) {
        return Some(token.to_string());
    }
    let (sign, rest) = match token.chars().next() {
        Some(c @ ('+' | '-')) => (c.to_string(), &token[1..]),
        _ => (String::new(), token),
    };
    if field_query(rest).is_some() {
        return Some(token.to_string());
    }
    // Backslash escapes inside a phrase; the tokenizer splits on it anyway
    let phrase = literal(rest).replace('\\', " ");
    if phrase.trim().is_empty() {
        return None;
    }
    Some(format!("{sign}\"{phrase}\""))
}

/// The literal a query token requires on a matching line, if any.
/// Excluded terms, boolean operators and other fields filter nothing.
fn line_term(token: &str) -> Option<String> {
    if token.starts_with('-') || is_operator(token) {
        return None;
    }
    let token = token.trim_start_matches('+');
    let token = match field_query(token) {
        Some(("content", value)) => value,
        Some(_) => return None,
        None => token,
    };
    let term = literal(token);
    (!term.is_empty()).then_some(term)
}
