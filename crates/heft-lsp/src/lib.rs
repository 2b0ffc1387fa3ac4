//! # heft-lsp
//!
//! Language server host for heft. Editor notifications become orchestrator
//! inputs; analysis results come back as inlay hints (package sizes) and
//! published diagnostics (vulnerabilities, infrastructure issues).
//!
//! ```text
//! client ──didOpen/didChange/didSave──▶ HeftServer ──Input──▶ Orchestrator
//!    ▲                                                            │
//!    └──── publishDiagnostics / inlayHint/refresh ◀── LspSurface ◀┘
//! ```
//!
//! Logging goes to stderr; stdout carries the protocol.
//!
//! ## Usage
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() {
//!     heft_lsp::serve(heft_lsp::SetupOptions::default()).await.unwrap();
//! }
//! ```

mod capabilities;
pub mod commands;
pub mod render;
mod server;
pub mod setup;
pub mod surface;

pub use capabilities::server_capabilities;
pub use commands::parse_command;
pub use server::{patterns_from_settings, HeftServer};
pub use setup::{Backends, SetupError, SetupOptions};
pub use surface::{LspSurface, Outbound};

use tower_lsp::{LspService, Server};

/// Start the language server on stdin/stdout.
pub async fn serve(options: SetupOptions) -> std::io::Result<()> {
    tracing::info!("Starting heft language server");
    let backends = Backends::load(&options).await;

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(move |client| HeftServer::new(client, backends));

    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

/// Start the language server on a TCP socket, for debugging.
///
/// Serves a single connection.
pub async fn serve_tcp(options: SetupOptions, port: u16) -> std::io::Result<()> {
    use tokio::net::TcpListener;

    let backends = Backends::load(&options).await;

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!("Listening on 127.0.0.1:{}", port);

    let (stream, addr) = listener.accept().await?;
    tracing::info!("Accepted connection from {}", addr);

    let (read, write) = tokio::io::split(stream);

    let (service, socket) = LspService::new(move |client| HeftServer::new(client, backends));

    Server::new(read, write, socket).serve(service).await;

    Ok(())
}
