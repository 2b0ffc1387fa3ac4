//! The event loop tying editor events and commands to the pipeline.

use crate::classifier::DocumentClassifier;
use crate::collaborators::Collaborators;
use crate::input::{Command, EditorEvent, Inbox, InboxReceiver, Input, TaggedEvent};
use crate::router::EventRouter;
use crate::session::{ProcessOutcome, SessionManager};
use crate::suppression::ShownRegistry;
use crate::watcher::PackageWatcherRegistry;
use heft_config::Credential;
use heft_core::{Document, ReportItem};
use heft_info::new_session_token;
use std::ops::ControlFlow;
use std::path::Path;

/// Owns all orchestration state and handles one [`Input`] at a time.
///
/// The orchestrator starts Active. While Suppressed, editor events only
/// update the current document and no sessions run.
///
/// # Examples
///
/// ```no_run
/// # use heft_orchestrator::{inbox, Collaborators, Orchestrator};
/// # async fn host(collaborators: Collaborators) {
/// let (tx, rx) = inbox();
/// let mut orchestrator = Orchestrator::new(collaborators, tx.clone());
/// orchestrator.start();
/// tokio::spawn(orchestrator.run(rx));
/// // the host now feeds editor events and commands through `tx`
/// # }
/// ```
#[derive(Debug)]
pub struct Orchestrator {
    collaborators: Collaborators,
    inbox: Inbox,
    sessions: SessionManager,
    router: EventRouter,
    watchers: PackageWatcherRegistry,
    shown: ShownRegistry,
    active: bool,
    current: Option<Document>,
    sign_in_pending: bool,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, inbox: Inbox) -> Self {
        let classifier = DocumentClassifier::new(collaborators.config.clone());
        let sessions = SessionManager::new(
            classifier,
            collaborators.engine.clone(),
            collaborators.diagnostics.clone(),
            inbox.clone(),
        );
        let router = EventRouter::new(
            collaborators.decorations.clone(),
            collaborators.diagnostics.clone(),
        );
        let watchers = PackageWatcherRegistry::new(collaborators.watcher.clone(), inbox.clone());

        Self {
            collaborators,
            inbox,
            sessions,
            router,
            watchers,
            shown: ShownRegistry::new(),
            active: true,
            current: None,
            sign_in_pending: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.current.as_ref()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn watchers(&self) -> &PackageWatcherRegistry {
        &self.watchers
    }

    pub fn shown(&self) -> &ShownRegistry {
        &self.shown
    }

    /// Sets the focused document without analyzing it.
    ///
    /// Hosts that already have an editor open call this before [`start`].
    ///
    /// [`start`]: Orchestrator::start
    pub fn set_current_document(&mut self, document: Option<Document>) {
        self.current = document;
    }

    pub fn is_sign_in_pending(&self) -> bool {
        self.sign_in_pending
    }

    /// Host startup: analyze the already-open document once.
    pub fn start(&mut self) {
        if self.active {
            self.process_current();
        }
    }

    /// Analyze `document` now, regardless of the active state.
    pub fn process(&mut self, document: &Document) -> ProcessOutcome {
        self.sessions.process(document)
    }

    fn process_current(&mut self) -> Option<ProcessOutcome> {
        let document = self.current.clone()?;
        Some(self.sessions.process(&document))
    }

    /// Drops cached costs and shown markers, then re-analyzes the current
    /// document when active.
    pub fn recheck(&mut self) {
        self.collaborators.cache.invalidate();
        self.shown.clear();
        if self.active {
            self.process_current();
        }
    }

    /// Handles one input. Breaks once the loop should stop.
    pub fn handle(&mut self, input: Input) -> ControlFlow<()> {
        match input {
            Input::Editor(event) => self.on_editor(event),
            Input::Command(command) => self.on_command(command),
            Input::Session(tagged) => self.on_session_event(tagged),
            Input::SessionFinished { path, generation } => {
                if self.sessions.finish(&path, generation) {
                    tracing::debug!(path = %path.display(), generation, "session complete");
                }
            }
            Input::ManifestChanged(path) => {
                tracing::info!(path = %path.display(), "manifest changed, rechecking");
                self.recheck();
            }
            Input::SignInFinished(result) => self.on_sign_in_finished(result),
            Input::Shutdown => {
                self.sessions.detach_all();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Runs until [`Input::Shutdown`] or until every sender is gone.
    pub async fn run(mut self, mut rx: InboxReceiver) {
        while let Some(input) = rx.recv().await {
            if self.handle(input).is_break() {
                break;
            }
        }
        self.sessions.detach_all();
        tracing::debug!("orchestrator stopped");
    }

    fn on_editor(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::DocumentChanged(document) => {
                if self.current.as_ref().is_some_and(|c| c.path == document.path) {
                    self.current = Some(document.clone());
                }
                if self.active {
                    self.sessions.process(&document);
                }
            }
            EditorEvent::ActiveDocumentChanged(Some(document)) => {
                self.current = Some(document.clone());
                if self.active {
                    self.sessions.process(&document);
                }
            }
            EditorEvent::ActiveDocumentChanged(None) => {
                self.current = None;
            }
            EditorEvent::DocumentClosed { path, focus } => {
                self.sessions.detach(&path);
                self.collaborators.decorations.forget(&path);
                self.collaborators.diagnostics.clear(&path);
                if self.current.as_ref().is_some_and(|c| c.path == path) {
                    self.current = focus;
                }
            }
        }
    }

    fn on_session_event(&mut self, tagged: TaggedEvent) {
        let TaggedEvent {
            path,
            generation,
            event,
        } = tagged;

        let Some(category) = self.sessions.current_category(&path, generation) else {
            tracing::trace!(path = %path.display(), generation, kind = event.kind(), "dropping stale event");
            return;
        };
        self.router
            .route(&path, category, event, &mut self.watchers, &mut self.shown);
    }

    fn on_command(&mut self, command: Command) {
        self.collaborators.telemetry.track(command.action());

        match command {
            Command::Check => self.recheck(),
            Command::Toggle => self.toggle(),
            Command::SignIn => self.sign_in(),
            Command::SignOut => self.sign_out(),
            Command::ShowOutput(item) => self.show_output(item),
            Command::OpenVulnPage(package) => self.open_vuln_page(&package),
        }
    }

    fn toggle(&mut self) {
        self.active = !self.active;
        tracing::info!(active = self.active, "toggled analysis");

        if self.active {
            self.process_current();
        } else {
            self.sessions.detach_all();
            self.collaborators.decorations.clear_all();
        }
    }

    fn sign_in(&mut self) {
        let messenger = &self.collaborators.messenger;
        if self.collaborators.credentials.is_authenticated() {
            messenger.info("Already signed in.");
            return;
        }
        if self.sign_in_pending {
            messenger.info("Sign-in is already in progress.");
            return;
        }

        let session_token = new_session_token();
        let login_url = match self.collaborators.authenticator.login_url(&session_token) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "failed to build sign-in URL");
                messenger.error(&format!("Sign-in failed: {}", e));
                return;
            }
        };

        if let Err(e) = self.collaborators.opener.open(&login_url) {
            tracing::warn!(error = %e, url = %login_url, "failed to open browser");
            messenger.info(&format!("Open {} to sign in.", login_url));
        }

        self.sign_in_pending = true;
        let authenticator = self.collaborators.authenticator.clone();
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let result = authenticator
                .wait_for_token(&session_token)
                .await
                .map(Credential::new)
                .map_err(|e| e.to_string());
            let _ = inbox.send(Input::SignInFinished(result));
        });
    }

    fn on_sign_in_finished(&mut self, result: Result<Credential, String>) {
        self.sign_in_pending = false;

        let credential = match result {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!(error = %e, "sign-in failed");
                self.collaborators
                    .messenger
                    .error(&format!("Sign-in failed: {}", e));
                return;
            }
        };

        if let Err(e) = self.collaborators.credentials.store(credential) {
            tracing::error!(error = %e, "failed to store credential");
            self.collaborators
                .messenger
                .error(&format!("Could not save credentials: {}", e));
            return;
        }

        self.collaborators.messenger.info("Signed in.");
        if self.active && self.current.is_some() {
            self.recheck();
        }
    }

    fn sign_out(&mut self) {
        match self.collaborators.credentials.clear() {
            Ok(()) => self.collaborators.messenger.info("Signed out."),
            Err(e) => {
                tracing::error!(error = %e, "failed to clear credential");
                self.collaborators
                    .messenger
                    .error(&format!("Could not sign out: {}", e));
            }
        }
    }

    fn show_output(&self, item: Option<ReportItem>) {
        let output = &self.collaborators.output;
        if let Some(item) = item {
            output.append(&format!("{}\n{}", item.title, item.report));
        }
        output.reveal();
    }

    fn open_vuln_page(&self, package: &str) {
        let url = match heft_info::vuln_page_url(&self.collaborators.vuln_registry_url, package) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(package, error = %e, "cannot build advisory URL");
                self.collaborators.messenger.error(&e.to_string());
                return;
            }
        };

        if let Err(e) = self.collaborators.opener.open(&url) {
            tracing::warn!(url = %url, error = %e, "failed to open advisory page");
            self.collaborators
                .messenger
                .error(&format!("Could not open {}: {}", url, e));
        }
    }

    /// Whether the current session for `path` has delivered everything.
    pub fn is_settled(&self, path: &Path) -> bool {
        self.sessions.is_finished(path).unwrap_or(true)
    }
}
