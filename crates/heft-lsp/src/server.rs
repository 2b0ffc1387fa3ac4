//! The heft language server.

use crate::capabilities::server_capabilities;
use crate::commands::parse_command;
use crate::setup::Backends;
use crate::surface::{pump, LspSurface};
use heft_config::{ExtensionPatterns, SharedConfig};
use heft_core::Document;
use heft_orchestrator::{EditorEvent, Inbox, Input, Orchestrator};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_lsp::jsonrpc::{Error as RpcError, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

/// The orchestrator side of a running server.
struct Pipeline {
    inbox: Inbox,
    surface: Arc<LspSurface>,
    config: SharedConfig,
}

/// An open buffer; `opened` orders buffers by when they were opened.
#[derive(Debug, Clone)]
struct OpenDocument {
    document: Document,
    opened: u64,
}

/// Maps LSP notifications and commands onto the orchestrator.
///
/// A server whose setup failed stays inert: it answers requests but never
/// analyzes anything.
pub struct HeftServer {
    client: Client,
    pipeline: Option<Pipeline>,
    setup_error: Option<String>,
    documents: RwLock<HashMap<Url, OpenDocument>>,
    next_open: AtomicU64,
}

impl HeftServer {
    /// Starts the orchestrator and its client pump on the current runtime.
    pub fn new(client: Client, backends: std::result::Result<Backends, crate::SetupError>) -> Self {
        let (pipeline, setup_error) = match backends {
            Ok(backends) => (Some(Self::start_pipeline(&client, backends)), None),
            Err(e) => {
                tracing::error!(error = %e, "heft setup failed, serving without analysis");
                (None, Some(e.to_string()))
            }
        };

        Self {
            client,
            pipeline,
            setup_error,
            documents: RwLock::new(HashMap::new()),
            next_open: AtomicU64::new(0),
        }
    }

    fn start_pipeline(client: &Client, backends: Backends) -> Pipeline {
        let (surface, outbound) = LspSurface::new();
        let surface = Arc::new(surface);
        tokio::spawn(pump(client.clone(), outbound));

        let (inbox, rx) = heft_orchestrator::inbox();
        let mut orchestrator = Orchestrator::new(backends.collaborators(surface.clone()), inbox.clone());
        orchestrator.start();
        tokio::spawn(orchestrator.run(rx));

        Pipeline {
            inbox,
            surface,
            config: backends.config.clone(),
        }
    }

    fn post(&self, input: impl Into<Input>) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        if pipeline.inbox.send(input.into()).is_err() {
            tracing::warn!("orchestrator stopped, dropping input");
        }
    }

    fn document_path(uri: &Url) -> Option<PathBuf> {
        match uri.to_file_path() {
            Ok(path) => Some(path),
            Err(()) => {
                tracing::trace!(%uri, "ignoring non-file document");
                None
            }
        }
    }

    fn update_document(&self, uri: &Url, update: impl FnOnce(&mut Document)) -> Option<Document> {
        let mut documents = self.documents.write();
        let open = documents.get_mut(uri)?;
        update(&mut open.document);
        Some(open.document.clone())
    }
}

/// Removes `uri` from the open documents. Returns the closed document and
/// the most recently opened one still open.
fn close_document(
    documents: &mut HashMap<Url, OpenDocument>,
    uri: &Url,
) -> Option<(Document, Option<Document>)> {
    let closed = documents.remove(uri)?;
    let focus = documents
        .values()
        .max_by_key(|open| open.opened)
        .map(|open| open.document.clone());
    Some((closed.document, focus))
}

/// The `heft` section of `workspace/didChangeConfiguration` settings.
pub fn patterns_from_settings(settings: &Value) -> serde_json::Result<Option<ExtensionPatterns>> {
    match settings.get("heft").and_then(|heft| heft.get("patterns")) {
        Some(patterns) => serde_json::from_value(patterns.clone()).map(Some),
        None => Ok(None),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for HeftServer {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "heft".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        match &self.setup_error {
            None => {
                self.client
                    .log_message(MessageType::INFO, "heft language server initialized")
                    .await;
            }
            Some(e) => {
                self.client
                    .show_message(MessageType::ERROR, format!("heft is disabled: {}", e))
                    .await;
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.post(Input::Shutdown);
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        let Some(path) = Self::document_path(&item.uri) else {
            return;
        };

        let document = Document::new(path, item.language_id, item.text);
        let opened = self.next_open.fetch_add(1, Ordering::Relaxed);
        self.documents.write().insert(
            item.uri,
            OpenDocument {
                document: document.clone(),
                opened,
            },
        );
        self.post(EditorEvent::ActiveDocumentChanged(Some(document)));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        let updated = self.update_document(&params.text_document.uri, |document| {
            document.text = change.text;
            document.is_dirty = true;
        });
        if let Some(document) = updated {
            self.post(EditorEvent::DocumentChanged(document));
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let updated = self.update_document(&params.text_document.uri, |document| {
            if let Some(text) = params.text {
                document.text = text;
            }
            document.is_dirty = false;
        });
        if let Some(document) = updated {
            self.post(EditorEvent::DocumentChanged(document));
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let closed = close_document(&mut self.documents.write(), &params.text_document.uri);
        let Some((closed, focus)) = closed else {
            return;
        };
        self.post(EditorEvent::DocumentClosed {
            path: closed.path,
            focus,
        });
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        match patterns_from_settings(&params.settings) {
            Ok(Some(patterns)) => {
                tracing::info!("file patterns updated from client settings");
                pipeline.config.set_patterns(patterns);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid heft settings");
                self.client
                    .show_message(MessageType::WARNING, format!("Invalid heft settings: {}", e))
                    .await;
            }
        }
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let Some(pipeline) = &self.pipeline else {
            return Ok(None);
        };
        let documents = self.documents.read();
        let Some(OpenDocument { document, .. }) = documents.get(&params.text_document.uri) else {
            return Ok(None);
        };

        let range = params.range;
        let hints = pipeline
            .surface
            .hints(&document.path, &document.text)
            .into_iter()
            .filter(|hint| hint.position.line >= range.start.line && hint.position.line <= range.end.line)
            .collect();
        Ok(Some(hints))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let command = parse_command(&params.command, &params.arguments)
            .map_err(|e| RpcError::invalid_params(e.to_string()))?;

        if self.pipeline.is_none() {
            return Err(RpcError {
                code: tower_lsp::jsonrpc::ErrorCode::ServerError(1),
                message: "heft is disabled".into(),
                data: self.setup_error.clone().map(Value::String),
            });
        }

        self.post(command);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patterns_from_settings() {
        let settings = json!({
            "heft": { "patterns": { "typescript": ["\\.ts$"] } }
        });
        let patterns = patterns_from_settings(&settings).unwrap().unwrap();
        assert_eq!(patterns.typescript, vec!["\\.ts$".to_string()]);
        assert_eq!(patterns.html, ExtensionPatterns::default().html);

        assert!(patterns_from_settings(&json!({ "other": {} })).unwrap().is_none());
        assert!(patterns_from_settings(&json!({ "heft": { "patterns": 7 } })).is_err());
    }

    fn open(documents: &mut HashMap<Url, OpenDocument>, path: &str, opened: u64) -> Url {
        let uri = Url::from_file_path(path).unwrap();
        documents.insert(
            uri.clone(),
            OpenDocument {
                document: Document::new(path, "typescript", ""),
                opened,
            },
        );
        uri
    }

    #[test]
    fn test_closing_hands_focus_to_latest_open_document() {
        let mut documents = HashMap::new();
        let a = open(&mut documents, "/p/a.ts", 0);
        let b = open(&mut documents, "/p/b.ts", 1);
        open(&mut documents, "/p/c.ts", 2);

        let (closed, focus) = close_document(&mut documents, &b).unwrap();
        assert_eq!(closed.path, PathBuf::from("/p/b.ts"));
        assert_eq!(focus.unwrap().path, PathBuf::from("/p/c.ts"));

        assert!(close_document(&mut documents, &b).is_none());
        close_document(&mut documents, &Url::from_file_path("/p/c.ts").unwrap());
        let (_, focus) = close_document(&mut documents, &a).unwrap();
        assert!(focus.is_none());
    }
}
