//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::files::serve_root))
        .route("/{*path}", get(handlers::files::serve_path))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

/// Convert a handler panic into a 500 response.
///
/// Nothing past the router boundary can take the listener down.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(error = %detail, "panic during request");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("panic during request: {detail}"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::document::SERVE_HASH;

    fn test_router(root: &Path, markdown: bool) -> Router {
        create_router(Arc::new(AppState::new(root.to_path_buf(), markdown)))
    }

    async fn send(router: Router, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn header_hash(response: &Response) -> String {
        response.headers()[&SERVE_HASH].to_str().unwrap().to_string()
    }

    /// Extract the content of the serve-hash meta tag from a page.
    fn meta_hash(html: &str) -> String {
        let marker = r#"<meta name="serve-hash" content=""#;
        let start = html.find(marker).expect("meta tag missing") + marker.len();
        let end = html[start..].find('"').expect("unterminated meta") + start;
        html[start..end].to_string()
    }

    #[tokio::test]
    async fn test_root_listing_links_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();
        std::fs::write(root.path().join("notes.md"), "# Notes").unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let body = body_text(response).await;
        assert!(body.contains("<h1>Directory listing for /</h1>"));
        assert!(body.contains(r#"<a href="/sub/">sub/</a>"#));
        assert!(body.contains(r#"<a href="/notes.md">notes.md</a>"#));
        // No parent link at the root.
        assert!(!body.contains("../"));
    }

    #[tokio::test]
    async fn test_listing_has_parent_link() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();
        std::fs::write(root.path().join("sub").join("hello.txt"), "hi").unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/sub").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains(r#"<a href="/">../</a>"#));
        assert!(body.contains(r#"<a href="/sub/hello.txt">hello.txt</a>"#));
    }

    #[tokio::test]
    async fn test_listing_escapes_entry_names() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a<b.txt"), "").unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/").await;
        let body = body_text(response).await;

        assert!(body.contains("a&lt;b.txt"));
        assert!(!body.contains("<b.txt"));
    }

    #[tokio::test]
    async fn test_markdown_page_hash_matches_header() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("notes.md"), "# Hello\n\nSome *text*.\n").unwrap();

        let response = send(test_router(root.path(), true), Method::GET, "/notes.md").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");

        let hash = header_hash(&response);
        let body = body_text(response).await;
        assert!(body.contains(r#"<h1 id="hello">Hello</h1>"#));
        assert!(body.contains("<em>text</em>"));
        assert_eq!(meta_hash(&body), hash);
        // Markdown pages carry the math and highlighting libraries.
        assert!(body.contains("MathJax-script"));
        assert!(body.contains("hljs.highlightAll()"));
    }

    #[tokio::test]
    async fn test_head_matches_get_hash_with_empty_body() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("notes.md"), "# Hello\n").unwrap();

        let router = test_router(root.path(), true);
        let get = send(router.clone(), Method::GET, "/notes.md").await;
        let head = send(router, Method::HEAD, "/notes.md").await;

        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(header_hash(&get), header_hash(&head));
        assert!(body_text(head).await.is_empty());
    }

    #[tokio::test]
    async fn test_head_listing_matches_get_hash_with_empty_body() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();

        let router = test_router(root.path(), false);
        let get = send(router.clone(), Method::GET, "/").await;
        let head = send(router, Method::HEAD, "/").await;

        assert_eq!(head.status(), StatusCode::OK);
        assert_eq!(header_hash(&get), header_hash(&head));
        assert!(body_text(head).await.is_empty());
    }

    #[tokio::test]
    async fn test_markdown_disabled_serves_raw() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("notes.md"), "# Hello\n").unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/notes.md").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/markdown"));
        assert_eq!(body_text(response).await, "# Hello\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let root = tempfile::tempdir().unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/nope.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "file /nope.txt does not exist");
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(outer.path().join("secret.txt"), "SECRET").unwrap();

        let router = test_router(&root, false);
        for uri in ["/../secret.txt", "/%2e%2e/secret.txt"] {
            let response = send(router.clone(), Method::GET, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {uri}");
            assert!(!body_text(response).await.contains("SECRET"));
        }
    }

    #[tokio::test]
    async fn test_index_html_served_for_directory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("index.html"), "<html>home</html>").unwrap();
        // A README next to it must lose to index.html.
        std::fs::write(root.path().join("README.md"), "# Readme").unwrap();

        let response = send(test_router(root.path(), true), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<html>home</html>");
    }

    #[tokio::test]
    async fn test_index_html_directory_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("dir").join("index.html")).unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/dir").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_readme_rendered_case_insensitively() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("ReadMe.md"), "# Welcome\n").unwrap();

        let response = send(test_router(root.path(), true), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains(r#"<h1 id="welcome">Welcome</h1>"#));
        assert!(body.contains("MathJax-script"));
        // Rendered at the directory URL, so relative links resolve there.
        assert!(body.contains(r#"<script>const dirPath = "/";</script>"#));
    }

    #[tokio::test]
    async fn test_readme_ignored_when_markdown_disabled() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("README.md"), "# Welcome\n").unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("Directory listing for /"));
        assert!(body.contains(r#"<a href="/README.md">README.md</a>"#));
    }

    #[tokio::test]
    async fn test_nested_file_served_raw() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();
        std::fs::write(root.path().join("sub").join("hello.txt"), "hi").unwrap();

        let response = send(test_router(root.path(), false), Method::GET, "/sub/hello.txt").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "hi");
    }

    #[tokio::test]
    async fn test_post_is_method_not_allowed() {
        let root = tempfile::tempdir().unwrap();

        let response = send(test_router(root.path(), false), Method::POST, "/").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_listing_is_deterministic() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("b.txt"), "").unwrap();
        std::fs::write(root.path().join("a.txt"), "").unwrap();

        let router = test_router(root.path(), false);
        let first = header_hash(&send(router.clone(), Method::GET, "/").await);
        let second = header_hash(&send(router, Method::GET, "/").await);
        assert_eq!(first, second);
    }
}
