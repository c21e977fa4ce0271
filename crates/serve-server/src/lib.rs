//! HTTP server for the serve static file server.
//!
//! This crate provides a native Rust HTTP server using axum, serving:
//! - Raw files from a directory, with containment checks on every path
//! - Directory listings, `index.html`, and README resolution
//! - Markdown compiled to HTML on the fly (optional)
//!
//! Rendered pages carry a content hash in a `Serve-Hash` header and meta
//! tag; an embedded script polls the hash and reloads the page when the
//! underlying file changes.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use serve_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 8080,
//!         root: PathBuf::from("docs"),
//!         markdown: true,
//!     };
//!
//!     let server = Server::bind(&config).await.unwrap();
//!     println!("Listening on http://{}", server.local_addr().unwrap());
//!     server.serve().await.unwrap();
//! }
//! ```

mod app;
mod document;
mod error;
mod handlers;
mod paths;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;

pub use crate::error::{ServerError, StartupError};
pub use crate::paths::{is_within, normalize_path};

use crate::state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on. Port 0 lets the OS assign a free one.
    pub port: u16,
    /// Directory to serve.
    pub root: PathBuf,
    /// Compile Markdown files to HTML.
    pub markdown: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            root: PathBuf::from("."),
            markdown: false,
        }
    }
}

/// A bound server, not yet accepting connections.
///
/// Binding and serving are separate so callers can report the actual
/// listen address before the first request, which matters with port 0.
pub struct Server {
    listener: tokio::net::TcpListener,
    router: Router,
}

impl Server {
    /// Validate the served directory, build the router, and bind the
    /// listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing or not a directory,
    /// or if the listener cannot be bound.
    pub async fn bind(config: &ServerConfig) -> Result<Self, StartupError> {
        let root = validate_root(&config.root)?;
        tracing::info!(root = %root.display(), markdown = config.markdown, "serving directory");

        let state = Arc::new(AppState::new(root, config.markdown));
        let router = app::create_router(state);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| StartupError::Bind {
                port: config.port,
                source,
            })?;

        Ok(Self { listener, router })
    }

    /// The bound address, with the OS-assigned port resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be read from the
    /// socket.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve requests until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn serve(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Check that the served directory exists and is a directory, and fix its
/// absolute normalized form for the lifetime of the server.
fn validate_root(dir: &Path) -> Result<PathBuf, StartupError> {
    let metadata = std::fs::metadata(dir).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StartupError::MissingRoot(dir.to_path_buf())
        } else {
            StartupError::RootAccess {
                path: dir.to_path_buf(),
                source,
            }
        }
    })?;

    if !metadata.is_dir() {
        return Err(StartupError::NotADirectory(dir.to_path_buf()));
    }

    paths::normalize_path(dir).ok_or_else(|| StartupError::Resolve(dir.to_path_buf()))
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
