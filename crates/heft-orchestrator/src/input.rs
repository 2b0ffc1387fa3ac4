//! Messages handled by the orchestrator's event loop.

use heft_config::Credential;
use heft_core::{Document, ReportItem, SessionEvent};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Sending half of the orchestrator inbox.
pub type Inbox = mpsc::UnboundedSender<Input>;

/// Receiving half of the orchestrator inbox.
pub type InboxReceiver = mpsc::UnboundedReceiver<Input>;

/// Creates an orchestrator inbox.
pub fn inbox() -> (Inbox, InboxReceiver) {
    mpsc::unbounded_channel()
}

/// Notifications from the editor host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A document's text or dirty flag changed.
    DocumentChanged(Document),
    /// The focused document changed; `None` when no editor is focused.
    ActiveDocumentChanged(Option<Document>),
    /// A document was closed. `focus` is the document that takes over if the
    /// closed one was current.
    DocumentClosed { path: PathBuf, focus: Option<Document> },
}

/// User-invocable actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clear the cost cache and analyze the active document again.
    Check,
    /// Switch between active and suppressed.
    Toggle,
    SignIn,
    SignOut,
    /// Reveal the output log, optionally writing a report to it first.
    ShowOutput(Option<ReportItem>),
    /// Open the public advisory page of a package.
    OpenVulnPage(String),
}

impl Command {
    pub const CHECK: &'static str = "heft.check";
    pub const TOGGLE: &'static str = "heft.toggle";
    pub const SIGN_IN: &'static str = "heft.signIn";
    pub const SIGN_OUT: &'static str = "heft.signOut";
    pub const SHOW_OUTPUT: &'static str = "heft.showOutput";
    pub const OPEN_VULN_PAGE: &'static str = "heft.openVulnPage";

    /// Every command name, as registered with the editor.
    pub const NAMES: [&'static str; 6] = [
        Self::CHECK,
        Self::TOGGLE,
        Self::SIGN_IN,
        Self::SIGN_OUT,
        Self::SHOW_OUTPUT,
        Self::OPEN_VULN_PAGE,
    ];

    /// Editor-facing command name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Check => Self::CHECK,
            Command::Toggle => Self::TOGGLE,
            Command::SignIn => Self::SIGN_IN,
            Command::SignOut => Self::SIGN_OUT,
            Command::ShowOutput(_) => Self::SHOW_OUTPUT,
            Command::OpenVulnPage(_) => Self::OPEN_VULN_PAGE,
        }
    }

    /// Name used for telemetry (`check`, `signIn`, ...).
    pub fn action(&self) -> &'static str {
        self.name().trim_start_matches("heft.")
    }
}

/// One event from an analysis session, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    pub path: PathBuf,
    pub generation: u64,
    pub event: SessionEvent,
}

/// Everything the orchestrator reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Editor(EditorEvent),
    Command(Command),
    /// An event forwarded from a session.
    Session(TaggedEvent),
    /// A session's stream ended.
    SessionFinished { path: PathBuf, generation: u64 },
    /// A watched dependency manifest changed on disk.
    ManifestChanged(PathBuf),
    /// The background sign-in wait completed.
    SignInFinished(Result<Credential, String>),
    /// Stop the event loop.
    Shutdown,
}

impl From<EditorEvent> for Input {
    fn from(event: EditorEvent) -> Self {
        Input::Editor(event)
    }
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        Input::Command(command)
    }
}
