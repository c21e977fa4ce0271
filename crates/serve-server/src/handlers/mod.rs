//! HTTP request handlers.

pub(crate) mod files;

/// Convert a route capture (without leading slash) to a URL path (with leading slash).
///
/// The wildcard route captures paths without leading slashes (e.g., "guide",
/// "docs/page.md", "" for root), but titles, links, and error messages all
/// use URL paths with leading slashes.
pub(crate) fn to_url_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{path}")
    }
}
