//! # tree-browse
//!
//! Request handling for a source-code browsing and search site. A deployment
//! is an *instance* folder holding several independently indexed *trees*:
//!
//! ```text
//! instance/
//!   config.json          site settings and the list of trees
//!   trees/<tree>/...     pre-rendered HTML for every file and directory
//!   indexes/<tree>/      full-text index of the tree
//! ```
//!
//! ## Request flow
//!
//! ```text
//!   GET /<tree>/search ──► search::run_search ──► engine (blocking, with timeout)
//!                                │
//!                                ▼
//!                          SearchPage ──► JSON payload | rendered page
//!
//!   GET /<tree>/source/<path>   ──► browse::resolve ──► artifact on disk
//!   GET /<tree>/parallel/<path> ──► browse::parallel_url ──► redirect
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment and instance (`config.json`) configuration
//! - [`site`] - Read-only tree registry and site-wide settings
//! - [`models`] - Per-request types: query, pagination window, results, response state
//! - [`engine`] - Search backend traits, typed engine errors, and the tantivy backend
//! - [`search`] - The search orchestrator and its format-independent result
//! - [`browse`] - Browse path to artifact resolution and cross-tree navigation
//! - [`render`] - Page rendering sink for the `search` and `error` views
//! - [`api`] - Axum handlers and router
//! - [`state`] - Shared application state

pub mod api;
pub mod browse;
pub mod config;
pub mod engine;
pub mod models;
pub mod render;
pub mod search;
pub mod site;
pub mod state;
