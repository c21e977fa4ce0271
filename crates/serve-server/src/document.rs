//! HTML document assembly.
//!
//! Wraps a rendered body fragment into a complete HTML page: fixed head
//! with an embedded stylesheet, a content-hash meta tag, optional library
//! snippets, and the client-side scripts for live reload and relative
//! link rewriting.

use axum::body::Body;
use axum::http::{HeaderName, Method, header};
use axum::response::Response;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serve_renderer::escape_html;
use sha1::{Digest, Sha1};

/// Header carrying the content hash of the rendered body fragment.
pub const SERVE_HASH: HeaderName = HeaderName::from_static("serve-hash");

/// Document head up to (not including) the serve-hash meta tag.
const DOC_PREAMBLE: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><style>:root {color-scheme: light dark;}* {min-width: 0;min-height: 0;box-sizing: border-box;}body {font-family: sans-serif;}h1, h2, h3, h4, h5, h6 {font-family: serif;}code, pre {font-family: monospace;}main {max-width: 1000px;margin: 0 auto;padding: 4rem 1rem;}a {color: #007bff;text-decoration: underline;}a:hover {color: #0056b3;}table {border-collapse: collapse;width: 100%;}table, td, th {border: 1px solid;}td, th {padding: 0.5rem;}blockquote {margin: 0;padding: 0.5rem;background-color: #007bff40;border-left: 0.25rem solid #007bff;}code, blockquote {border-radius: 0.25rem;}pre > code:not(.hljs) {color: rgb(152, 168, 222);background-color: rgb(22, 25, 29);padding: 1em;display: block;}</style>"#;

/// Polls the current URL with HEAD requests and reloads the page when the
/// `Serve-Hash` response header no longer matches the embedded meta tag.
const UPDATE_SCRIPT: &str = r#"<script defer>const hashEl = document.querySelector('meta[name="serve-hash"]');if (!hashEl) {throw new Error("serve-hash meta tag not found");}const hash = hashEl.content;async function isContentUpToDate() {const response = await fetch(window.location.href, {cache: "no-store", method: "HEAD"});const newHash = response.headers.get("Serve-Hash");if (newHash !== hash) {window.location.reload();}}window.setInterval(isContentUpToDate, 2000);</script>"#;

/// Rewrites relative (`.`-prefixed) links against `dirPath` and opens every
/// other link in a new tab.
const ANCHORS_SCRIPT: &str = r#"<script defer>const anchors = document.querySelectorAll("a[href]");for(const a of anchors) {const href = a.getAttribute("href");if (href.startsWith(".")) {const url = new URL(window.location);url.pathname = ((dirPath || url.pathname) + href.substring(1)).replace(/\/+/g,"/");a.setAttribute("href", url.href);}else{a.setAttribute("target", "_blank");}}</script>"#;

/// Library snippets appended to rendered Markdown pages, in order: MathJax,
/// highlight.js stylesheet, highlight.js, highlight init.
pub const MARKDOWN_LIBS: &[&str] = &[
    r#"<script id="MathJax-script" async defer src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>"#,
    r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@11.9.0/build/styles/github-dark.min.css">"#,
    r#"<script src="https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@11.9.0/build/highlight.min.js"></script>"#,
    r#"<script defer>hljs.highlightAll();</script>"#,
];

/// Base64 of the SHA-1 digest of the body fragment.
///
/// Advisory change-detection token only, never an integrity check.
pub(crate) fn content_hash(content: &[u8]) -> String {
    BASE64_STANDARD.encode(Sha1::digest(content))
}

/// Escape a string for embedding in a double-quoted JS string literal.
///
/// `<` is escaped too so a crafted path cannot close the script tag.
fn escape_js_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '<' => escaped.push_str("\\u003c"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// A complete HTML page built around a rendered body fragment.
#[derive(Debug)]
pub struct HtmlDocument {
    title: String,
    body: String,
    dir_path: String,
    libs: &'static [&'static str],
}

impl HtmlDocument {
    /// Wrap a body fragment. The title lands HTML-escaped in `<title>`.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            dir_path: String::new(),
            libs: &[],
        }
    }

    /// Set the base directory the anchors script resolves `.`-prefixed
    /// links against. Defaults to empty, which falls back to the current
    /// pathname client-side.
    #[must_use]
    pub fn with_dir_path(mut self, dir_path: impl Into<String>) -> Self {
        self.dir_path = dir_path.into();
        self
    }

    /// Append library snippets after the body, in the given order.
    #[must_use]
    pub fn with_libs(mut self, libs: &'static [&'static str]) -> Self {
        self.libs = libs;
        self
    }

    /// Build the HTTP response for the document.
    ///
    /// `HEAD` gets the same headers with an empty body. The `Serve-Hash`
    /// header always equals the value embedded in the meta tag, so the
    /// update script can compare the two.
    pub fn respond(&self, method: &Method) -> Response {
        let hash = content_hash(self.body.as_bytes());
        let body = if method == Method::HEAD {
            Body::empty()
        } else {
            Body::from(self.render(&hash))
        };
        Response::builder()
            .header(header::CONTENT_TYPE, "text/html")
            .header(header::CACHE_CONTROL, "no-store")
            .header(SERVE_HASH, &hash)
            .body(body)
            .unwrap()
    }

    fn render(&self, hash: &str) -> String {
        let mut doc = String::with_capacity(DOC_PREAMBLE.len() + self.body.len() + 2048);
        doc.push_str(DOC_PREAMBLE);
        doc.push_str(&format!(r#"<meta name="serve-hash" content="{hash}">"#));
        doc.push_str(&format!(
            r#"<script>const dirPath = "{}";</script>"#,
            escape_js_string(&self.dir_path)
        ));
        doc.push_str(&format!("<title>{}</title>", escape_html(&self.title)));
        doc.push_str("</head><body><main>");
        doc.push_str(&self.body);
        doc.push_str("</main>");
        for lib in self.libs {
            doc.push_str(lib);
        }
        doc.push_str(UPDATE_SCRIPT);
        doc.push_str(ANCHORS_SCRIPT);
        doc.push_str("</body></html>");
        doc
    }
}
