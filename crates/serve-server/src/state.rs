//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;

use tower_http::services::ServeDir;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Absolute, normalized root directory being served.
    pub(crate) root: PathBuf,
    /// Whether Markdown files are compiled to HTML.
    pub(crate) markdown: bool,
    /// Raw file service for the fallback branch.
    pub(crate) assets: ServeDir,
}

impl AppState {
    /// Build state over an already-normalized root directory.
    pub(crate) fn new(root: PathBuf, markdown: bool) -> Self {
        // Directory requests are resolved by the handler, never by ServeDir.
        let assets = ServeDir::new(&root).append_index_html_on_directories(false);
        Self {
            root,
            markdown,
            assets,
        }
    }
}
