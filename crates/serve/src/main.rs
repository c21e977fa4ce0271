//! Serve CLI - static file server.
//!
//! Serves the content of a directory over HTTP, with optional Markdown
//! rendering, directory listings, and live page reload on file changes.

mod error;
mod output;

use std::path::PathBuf;

use clap::Parser;
use serve_server::{Server, ServerConfig};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::output::Output;

/// Serve the content of a directory over HTTP.
#[derive(Parser)]
#[command(name = "serve", version, about)]
struct Cli {
    /// Directory to serve.
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Port to listen on (0 lets the OS pick a free one).
    #[arg(short, long, default_value_t = 0)]
    port: u16,

    /// Compile Markdown files to HTML.
    #[arg(long)]
    md: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Initialize tracing with appropriate log level
    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to INFO
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    if let Err(err) = rt.block_on(run(cli, &output)) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Bind the server, report the address, and serve until shutdown.
async fn run(cli: Cli, output: &Output) -> Result<(), CliError> {
    let config = ServerConfig {
        port: cli.port,
        root: cli.dir,
        markdown: cli.md,
        ..ServerConfig::default()
    };

    let server = Server::bind(&config).await?;
    output.listening(&format!("http://{}", server.local_addr()?));
    server.serve().await?;

    Ok(())
}
