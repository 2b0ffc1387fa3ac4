use anyhow::{Context, Result};
use heft_lsp::SetupOptions;
use tokio::runtime::Runtime;

/// Serves the language protocol on stdio, or on `127.0.0.1:<tcp>`.
pub fn handle_lsp_command(setup: SetupOptions, tcp: Option<u16>) -> Result<()> {
    let runtime = Runtime::new().context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        match tcp {
            Some(port) => heft_lsp::serve_tcp(setup, port)
                .await
                .with_context(|| format!("Language server failed on port {}", port)),
            None => heft_lsp::serve(setup).await.context("Language server failed"),
        }
    })
}
