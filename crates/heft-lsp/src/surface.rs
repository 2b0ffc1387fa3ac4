//! Editor surfaces backed by the language client.
//!
//! Collaborator calls arrive synchronously from the orchestrator loop. The
//! surface updates its own state and queues [`Outbound`] messages, which
//! [`pump`] delivers to the client in order.

use crate::render;
use heft_core::{IacIssue, PackageInfo};
use heft_orchestrator::{
    DecorationRenderer, DiagnosticRenderer, Messenger, OutputLog, ShownRegistry, UrlOpener,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tower_lsp::lsp_types::{Diagnostic, InlayHint, MessageType, ShowDocumentParams, Url};
use tower_lsp::Client;

/// A message for the language client.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Publish { uri: Url, diagnostics: Vec<Diagnostic> },
    RefreshHints,
    Message { typ: MessageType, text: String },
    Log(String),
    ShowDocument(Url),
}

pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Shown by a reveal with nothing new to show.
pub const NO_NEW_OUTPUT: &str =
    "No new heft output. Earlier reports are in the heft language server log.";

#[derive(Debug, Default)]
struct FileDiagnostics {
    vulnerabilities: Vec<Diagnostic>,
    iac: Vec<Diagnostic>,
}

impl FileDiagnostics {
    fn all(&self) -> Vec<Diagnostic> {
        self.vulnerabilities.iter().chain(&self.iac).cloned().collect()
    }
}

#[derive(Debug)]
pub struct LspSurface {
    outbound: mpsc::UnboundedSender<Outbound>,
    packages: Mutex<HashMap<PathBuf, Vec<PackageInfo>>>,
    issues: Mutex<HashMap<PathBuf, Vec<IacIssue>>>,
    diagnostics: Mutex<HashMap<PathBuf, FileDiagnostics>>,
    output: Mutex<Vec<String>>,
}

impl LspSurface {
    pub fn new() -> (Self, OutboundReceiver) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let surface = Self {
            outbound,
            packages: Mutex::new(HashMap::new()),
            issues: Mutex::new(HashMap::new()),
            diagnostics: Mutex::new(HashMap::new()),
            output: Mutex::new(Vec::new()),
        };
        (surface, rx)
    }

    fn send(&self, message: Outbound) {
        if self.outbound.send(message).is_err() {
            tracing::debug!("language client gone, dropping message");
        }
    }

    fn publish(&self, path: &Path, diagnostics: Vec<Diagnostic>) {
        match Url::from_file_path(path) {
            Ok(uri) => self.send(Outbound::Publish { uri, diagnostics }),
            Err(()) => tracing::warn!(path = %path.display(), "cannot publish diagnostics for non-absolute path"),
        }
    }

    fn publish_current(&self, path: &Path) {
        let diagnostics = self
            .diagnostics
            .lock()
            .get(path)
            .map(FileDiagnostics::all)
            .unwrap_or_default();
        self.publish(path, diagnostics);
    }

    /// Inlay hints for `path`, positioned against `text`.
    pub fn hints(&self, path: &Path, text: &str) -> Vec<InlayHint> {
        let mut hints: Vec<InlayHint> = self
            .packages
            .lock()
            .get(path)
            .map(|packages| packages.iter().map(|p| render::package_hint(p, text)).collect())
            .unwrap_or_default();
        if let Some(issues) = self.issues.lock().get(path) {
            hints.extend(issues.iter().map(|issue| render::iac_hint(issue, text)));
        }
        hints
    }
}

impl DecorationRenderer for LspSurface {
    fn render_pending(&self, path: &Path, packages: &[PackageInfo]) {
        self.packages.lock().insert(path.to_path_buf(), packages.to_vec());
        self.send(Outbound::RefreshHints);
    }

    fn render_package(&self, path: &Path, package: &PackageInfo) {
        {
            let mut packages = self.packages.lock();
            let entries = packages.entry(path.to_path_buf()).or_default();
            match entries.iter_mut().find(|p| p.name == package.name) {
                Some(existing) => *existing = package.clone(),
                None => entries.push(package.clone()),
            }
        }
        self.send(Outbound::RefreshHints);
    }

    fn render_final(&self, path: &Path, packages: &[PackageInfo]) {
        self.packages.lock().insert(path.to_path_buf(), packages.to_vec());
        self.send(Outbound::RefreshHints);
    }

    fn forget(&self, path: &Path) {
        self.packages.lock().remove(path);
        self.issues.lock().remove(path);
        self.send(Outbound::RefreshHints);
    }

    fn clear_all(&self) {
        self.packages.lock().clear();
        self.issues.lock().clear();
        self.send(Outbound::RefreshHints);
    }
}

impl DiagnosticRenderer for LspSurface {
    fn render_vulnerabilities(&self, path: &Path, packages: &[PackageInfo], shown: &mut ShownRegistry) {
        let mut rendered = Vec::new();
        for package in packages {
            for vulnerability in &package.vulnerabilities {
                rendered.push(render::vulnerability_diagnostic(package, vulnerability));
                if shown.mark_shown(ShownRegistry::vulnerability_key(path, vulnerability)) {
                    self.send(Outbound::Message {
                        typ: MessageType::WARNING,
                        text: render::vulnerability_notice(vulnerability),
                    });
                }
            }
        }

        self.diagnostics
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .vulnerabilities = rendered;
        self.publish_current(path);
    }

    fn clear(&self, path: &Path) {
        self.diagnostics.lock().remove(path);
        if self.issues.lock().remove(path).is_some() {
            self.send(Outbound::RefreshHints);
        }
        self.publish(path, Vec::new());
    }

    fn decorate_existing(&self, path: &Path) {
        self.publish_current(path);
    }

    fn render_iac_issue(&self, path: &Path, issue: &IacIssue, shown: &mut ShownRegistry) {
        self.diagnostics
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .iac
            .push(render::iac_diagnostic(issue));
        self.issues
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .push(issue.clone());

        if shown.mark_shown(ShownRegistry::iac_key(path, issue)) {
            self.send(Outbound::Message {
                typ: MessageType::WARNING,
                text: render::iac_notice(issue),
            });
        }
        self.publish_current(path);
        self.send(Outbound::RefreshHints);
    }
}

impl Messenger for LspSurface {
    fn info(&self, message: &str) {
        self.send(Outbound::Message {
            typ: MessageType::INFO,
            text: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.send(Outbound::Message {
            typ: MessageType::ERROR,
            text: message.to_string(),
        });
    }
}

impl OutputLog for LspSurface {
    fn append(&self, text: &str) {
        self.output.lock().push(text.to_string());
        self.send(Outbound::Log(text.to_string()));
    }

    /// Shows what was appended since the last reveal, or where earlier
    /// output went.
    fn reveal(&self) {
        let pending = std::mem::take(&mut *self.output.lock());
        let text = if pending.is_empty() {
            NO_NEW_OUTPUT.to_string()
        } else {
            pending.join("\n\n")
        };
        self.send(Outbound::Message {
            typ: MessageType::INFO,
            text,
        });
    }
}

impl UrlOpener for LspSurface {
    fn open(&self, url: &Url) -> io::Result<()> {
        self.outbound
            .send(Outbound::ShowDocument(url.clone()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "language client is gone"))
    }
}

/// Delivers queued messages to the client until the surface is dropped.
pub async fn pump(client: Client, mut rx: OutboundReceiver) {
    while let Some(message) = rx.recv().await {
        match message {
            Outbound::Publish { uri, diagnostics } => {
                client.publish_diagnostics(uri, diagnostics, None).await;
            }
            Outbound::RefreshHints => {
                if let Err(e) = client.inlay_hint_refresh().await {
                    tracing::debug!(error = %e, "inlay hint refresh not supported");
                }
            }
            Outbound::Message { typ, text } => client.show_message(typ, text).await,
            Outbound::Log(text) => client.log_message(MessageType::LOG, text).await,
            Outbound::ShowDocument(uri) => {
                let params = ShowDocumentParams {
                    uri: uri.clone(),
                    external: Some(true),
                    take_focus: Some(true),
                    selection: None,
                };
                match client.show_document(params).await {
                    Ok(true) => {}
                    Ok(false) | Err(_) => {
                        client
                            .show_message(MessageType::INFO, format!("Open {} in your browser.", uri))
                            .await;
                    }
                }
            }
        }
    }
}
