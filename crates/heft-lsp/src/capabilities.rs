//! LSP server capabilities declaration.

use heft_orchestrator::Command;
use tower_lsp::lsp_types::*;

/// Build the server capabilities to advertise to the client.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // Whole-document sync; the engine re-reads the full text anyway
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: Some(false),
                will_save_wait_until: Some(false),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(true),
                })),
            },
        )),

        // Package sizes
        inlay_hint_provider: Some(OneOf::Left(true)),

        execute_command_provider: Some(ExecuteCommandOptions {
            commands: Command::NAMES.iter().map(|name| name.to_string()).collect(),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),

        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertises_every_command() {
        let capabilities = server_capabilities();
        let commands = capabilities.execute_command_provider.unwrap().commands;
        assert_eq!(commands.len(), Command::NAMES.len());
        assert!(commands.contains(&"heft.openVulnPage".to_string()));
    }
}
