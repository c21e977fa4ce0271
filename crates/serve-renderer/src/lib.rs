//! Markdown to HTML fragment rendering.
//!
//! This crate turns raw markdown text into an HTML body fragment. It never
//! fails and never touches the filesystem: include directives are stripped,
//! malformed input degrades to whatever the parser makes of it, and the
//! same input always produces the same bytes.
//!
//! # Dialect
//!
//! CommonMark plus tables, footnotes, strikethrough, heading attributes
//! (`{#id .class key=value}` blocks), math (`$`/`$$` with MathJax
//! delimiters in the output), definition lists, superscript, and
//! subscript. Two or more consecutive blank lines end an open list, so
//! adjacent lists stay separate. Heading anchors are generated by
//! slugifying the heading text with per-document deduplication.
//!
//! # Example
//!
//! ```
//! use serve_renderer::render_markdown;
//!
//! let html = render_markdown("# Hello\n\n**Bold** text");
//! assert!(html.contains(r#"<h1 id="hello">Hello</h1>"#));
//! ```

mod fence;
mod include;
mod lists;
mod renderer;
mod state;

pub use include::strip_includes;
pub use lists::break_lists;
pub use renderer::{MarkdownRenderer, render_markdown};
pub use state::{escape_html, slugify};
