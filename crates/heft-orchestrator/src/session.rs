//! One analysis session per document.

use crate::classifier::DocumentClassifier;
use crate::collaborators::DiagnosticRenderer;
use crate::input::{Inbox, Input, TaggedEvent};
use futures::StreamExt;
use heft_core::{AnalysisEngine, AnalysisRequest, Category, Document, SessionStream};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What [`SessionManager::process`] did with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// No analysis applies to the document.
    Inapplicable,
    /// Unsaved infrastructure document: diagnostics cleared, nothing started.
    SkippedDirty,
    /// A new session is now current for the document.
    Started { category: Category, generation: u64 },
}

struct ActiveSession {
    generation: u64,
    category: Category,
    forwarder: JoinHandle<()>,
    finished: bool,
}

/// Keeps at most one live session per document path.
///
/// Each session gets a generation number that only ever grows. Starting a
/// session for a path aborts the previous session's forwarder before the
/// new one is registered, and events still queued from an older generation
/// are rejected by [`SessionManager::current_category`].
pub struct SessionManager {
    classifier: DocumentClassifier,
    engine: Arc<dyn AnalysisEngine>,
    diagnostics: Arc<dyn DiagnosticRenderer>,
    inbox: Inbox,
    sessions: HashMap<PathBuf, ActiveSession>,
    next_generation: u64,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("engine", &self.engine.name())
            .field("sessions", &self.sessions.len())
            .field("next_generation", &self.next_generation)
            .finish()
    }
}

impl SessionManager {
    pub fn new(
        classifier: DocumentClassifier,
        engine: Arc<dyn AnalysisEngine>,
        diagnostics: Arc<dyn DiagnosticRenderer>,
        inbox: Inbox,
    ) -> Self {
        Self {
            classifier,
            engine,
            diagnostics,
            inbox,
            sessions: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Classifies `document` and (re)starts its session when applicable.
    pub fn process(&mut self, document: &Document) -> ProcessOutcome {
        let path = document.path();
        let Some(category) = self.classifier.classify(document) else {
            tracing::trace!(path = %path.display(), language = %document.language_id, "document not applicable");
            return ProcessOutcome::Inapplicable;
        };

        if category == Category::Infrastructure && document.is_dirty {
            tracing::debug!(path = %path.display(), "unsaved infrastructure document, clearing diagnostics");
            self.detach(path);
            self.diagnostics.clear(path);
            return ProcessOutcome::SkippedDirty;
        }

        self.detach(path);

        self.next_generation += 1;
        let generation = self.next_generation;
        let stream = self.engine.start(AnalysisRequest {
            path: document.path.clone(),
            text: document.text.clone(),
            category,
        });
        let forwarder = tokio::spawn(forward(
            document.path.clone(),
            generation,
            stream,
            self.inbox.clone(),
        ));

        tracing::debug!(path = %path.display(), %category, generation, "session started");
        self.sessions.insert(
            document.path.clone(),
            ActiveSession {
                generation,
                category,
                forwarder,
                finished: false,
            },
        );

        ProcessOutcome::Started {
            category,
            generation,
        }
    }

    /// Category of the session, if `generation` is still current for `path`.
    pub fn current_category(&self, path: &Path, generation: u64) -> Option<Category> {
        self.sessions
            .get(path)
            .filter(|session| session.generation == generation)
            .map(|session| session.category)
    }

    /// Current generation for `path`.
    pub fn generation(&self, path: &Path) -> Option<u64> {
        self.sessions.get(path).map(|session| session.generation)
    }

    /// Records that a session's stream ended. Stale generations are ignored.
    pub fn finish(&mut self, path: &Path, generation: u64) -> bool {
        match self.sessions.get_mut(path) {
            Some(session) if session.generation == generation => {
                session.finished = true;
                true
            }
            _ => false,
        }
    }

    /// Whether the current session for `path` has delivered all its events.
    pub fn is_finished(&self, path: &Path) -> Option<bool> {
        self.sessions.get(path).map(|session| session.finished)
    }

    /// Stops observing the session for `path`, if any.
    pub fn detach(&mut self, path: &Path) -> bool {
        match self.sessions.remove(path) {
            Some(session) => {
                session.forwarder.abort();
                tracing::trace!(path = %path.display(), generation = session.generation, "session detached");
                true
            }
            None => false,
        }
    }

    /// Stops observing every session.
    pub fn detach_all(&mut self) {
        for (_, session) in self.sessions.drain() {
            session.forwarder.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.detach_all();
    }
}

/// Pumps one session's events into the inbox, tagged with their origin.
async fn forward(path: PathBuf, generation: u64, mut stream: SessionStream, inbox: Inbox) {
    while let Some(event) = stream.next().await {
        let tagged = TaggedEvent {
            path: path.clone(),
            generation,
            event,
        };
        if inbox.send(Input::Session(tagged)).is_err() {
            return;
        }
    }
    let _ = inbox.send(Input::SessionFinished { path, generation });
}
