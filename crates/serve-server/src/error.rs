//! Error types for the HTTP server.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Request handling error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Nothing exists at the request path, or the path escapes the
    /// served directory. Both cases answer identically so a client cannot
    /// tell them apart. Holds the URL path, not the filesystem path.
    #[error("file {0} does not exist")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();
        tracing::error!(code = %status, error = %message, "error during request");
        (status, message).into_response()
    }
}

/// Errors raised before the server starts accepting connections.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The directory to serve does not exist.
    #[error("{0} does not exist")]
    MissingRoot(PathBuf),

    /// The path to serve exists but is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// The directory to serve could not be inspected.
    #[error("cannot access {path}: {source}")]
    RootAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The directory path could not be made absolute.
    #[error("cannot resolve absolute path for {0}")]
    Resolve(PathBuf),

    /// The listener could not be bound.
    #[error("failed to listen on port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[tokio::test]
    async fn test_not_found_response() {
        let response = ServerError::NotFound("/missing.txt".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"file /missing.txt does not exist");
    }

    #[test]
    fn test_io_error_is_internal() {
        let error = ServerError::from(std::io::Error::other("disk on fire"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_startup_error_messages() {
        let error = StartupError::NotADirectory(PathBuf::from("notes.txt"));
        assert_eq!(error.to_string(), "notes.txt is not a directory");

        let error = StartupError::Bind {
            port: 80,
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(error.to_string().starts_with("failed to listen on port 80"));
    }
}
