//! File serving endpoint.
//!
//! Resolves each request path against the served root and picks a branch:
//! directory resolution (index.html, README, listing), Markdown rendering,
//! or raw file serving. The branch decision tree is terminal: the first
//! match answers the request.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::Method;
use axum::response::Response;
use serve_renderer::{escape_html, render_markdown};
use tower_http::services::ServeFile;

use crate::document::{HtmlDocument, MARKDOWN_LIBS};
use crate::error::ServerError;
use crate::handlers::to_url_path;
use crate::paths::{is_within, normalize_path};
use crate::state::AppState;

/// Handle GET/HEAD / (served root).
pub(crate) async fn serve_root(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ServerError> {
    serve_path_impl(String::new(), state, request).await
}

/// Handle GET/HEAD /{*path}.
pub(crate) async fn serve_path(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ServerError> {
    serve_path_impl(path, state, request).await
}

/// Shared implementation for file serving.
#[allow(clippy::needless_pass_by_value)]
async fn serve_path_impl(
    path: String,
    state: Arc<AppState>,
    request: Request,
) -> Result<Response, ServerError> {
    // The capture is already percent-decoded and has no leading slash;
    // stray extra slashes would make join treat it as absolute.
    let path = path.trim_start_matches('/');
    let url_path = to_url_path(path);

    let Some(full_path) = normalize_path(&state.root.join(path)) else {
        return Err(ServerError::NotFound(url_path));
    };

    tracing::debug!(
        method = %request.method(),
        uri = %request.uri(),
        path = %full_path.display(),
        "request"
    );

    let metadata = match tokio::fs::metadata(&full_path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound(url_path));
        }
        Err(e) => return Err(ServerError::Io(e)),
    };

    // Paths outside the root answer exactly like missing ones.
    if !is_within(&full_path, &state.root) {
        return Err(ServerError::NotFound(url_path));
    }

    if metadata.is_dir() {
        return serve_directory(&url_path, &full_path, &state, request).await;
    }

    if state.markdown && url_path.ends_with(".md") {
        return serve_markdown(&url_path, &full_path, String::new(), request.method()).await;
    }

    serve_raw(&state, request).await
}

/// Serve a directory: index.html if present, else a rendered README when
/// Markdown is enabled, else a synthesized listing.
async fn serve_directory(
    url_path: &str,
    dir: &std::path::Path,
    state: &AppState,
    request: Request,
) -> Result<Response, ServerError> {
    tracing::debug!("path is a directory");

    let index_path = dir.join("index.html");
    match tokio::fs::metadata(&index_path).await {
        Ok(metadata) if metadata.is_dir() => {
            // A directory named index.html has to be requested explicitly.
            return Err(ServerError::NotFound(url_path.to_string()));
        }
        Ok(_) => {
            tracing::debug!("serving index.html");
            return serve_file(&index_path, request).await;
        }
        Err(_) => {}
    }

    if state.markdown
        && let Some(readme) = find_readme(dir).await?
    {
        tracing::debug!(path = %readme.display(), "serving readme");
        return serve_markdown(url_path, &readme, url_path.to_string(), request.method()).await;
    }

    tracing::debug!("serving directory listing");
    serve_listing(url_path, dir, request.method()).await
}

/// Find a case-insensitive `README.md` in `dir`.
///
/// Ties between case variants go to the first name in byte order, so the
/// pick is stable across platforms and directory iteration orders.
async fn find_readme(dir: &std::path::Path) -> Result<Option<PathBuf>, ServerError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().eq_ignore_ascii_case("readme.md") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names.first().map(|name| dir.join(name)))
}

/// Render a Markdown file and wrap it into a full document.
async fn serve_markdown(
    url_path: &str,
    file: &std::path::Path,
    dir_path: String,
    method: &Method,
) -> Result<Response, ServerError> {
    let bytes = tokio::fs::read(file).await?;
    // Invalid UTF-8 degrades to replacement characters, it never errors.
    let source = String::from_utf8_lossy(&bytes);
    let body = render_markdown(&source);

    Ok(HtmlDocument::new(url_path, body)
        .with_dir_path(dir_path)
        .with_libs(MARKDOWN_LIBS)
        .respond(method))
}

/// Synthesize a directory listing and wrap it into a full document.
async fn serve_listing(
    url_path: &str,
    dir: &std::path::Path,
    method: &Method,
) -> Result<Response, ServerError> {
    let mut entries = Vec::new();
    let mut dir_entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = dir_entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        entries.push((name, is_dir));
    }
    entries.sort();

    let mut body = format!("<h1>Directory listing for {}</h1>", escape_html(url_path));
    body.push_str("<ul>");
    if url_path != "/" {
        body.push_str(&format!(
            r#"<li><a href="{}">../</a></li>"#,
            escape_html(&parent_url(url_path))
        ));
    }
    for (name, is_dir) in &entries {
        let mut href = join_url(url_path, name);
        let mut display = name.clone();
        if *is_dir {
            href.push('/');
            display.push('/');
        }
        body.push_str(&format!(
            r#"<li><a href="{}">{}</a></li>"#,
            escape_html(&href),
            escape_html(&display)
        ));
    }
    body.push_str("</ul>");

    Ok(HtmlDocument::new(url_path, body)
        .with_dir_path(url_path)
        .respond(method))
}

/// Serve a single file raw, with conditional and range support.
async fn serve_file(path: &std::path::Path, request: Request) -> Result<Response, ServerError> {
    let mut file = ServeFile::new(path);
    let response = file.try_call(request).await?;
    Ok(response.map(Body::new))
}

/// Fall back to raw file serving under the root.
async fn serve_raw(state: &AppState, request: Request) -> Result<Response, ServerError> {
    let mut assets = state.assets.clone();
    let response = assets.try_call(request).await?;
    Ok(response.map(Body::new))
}

/// Parent URL of a directory path.
fn parent_url(url_path: &str) -> String {
    let trimmed = url_path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
    }
}

/// Join an entry name under a directory URL.
fn join_url(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}
