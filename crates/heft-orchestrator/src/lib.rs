//! Document analysis orchestration for heft.
//!
//! Decides which documents to analyze, keeps one analysis session per
//! document, routes session events to the rendering surfaces and reacts to
//! dependency manifest changes.
//!
//! ```text
//! editor events ─┐
//! commands ──────┼─▶ Orchestrator ─▶ DocumentClassifier ─▶ SessionManager ─▶ engine
//! watchers ──────┘        ▲                                      │
//!                         └───────── tagged session events ◀─────┘
//!                                           │
//!                                      EventRouter ─▶ decorations / diagnostics
//! ```
//!
//! Everything runs on one task: [`Orchestrator::run`] drains a single inbox.
//! Sessions, watches and the sign-in wait only ever talk back by posting an
//! [`Input`].

pub mod classifier;
pub mod collaborators;
pub mod controller;
pub mod input;
pub mod recording;
pub mod router;
pub mod session;
pub mod suppression;
pub mod watcher;

pub use classifier::{classify, DocumentClassifier, MANIFEST_FILE_NAME};
pub use collaborators::{
    Collaborators, DecorationRenderer, DiagnosticRenderer, Messenger, OutputLog, Telemetry,
    TracingTelemetry, UrlOpener,
};
pub use controller::Orchestrator;
pub use input::{inbox, Command, EditorEvent, Inbox, InboxReceiver, Input, TaggedEvent};
pub use recording::{Call, Recorder};
pub use router::{EventRouter, Route};
pub use session::{ProcessOutcome, SessionManager};
pub use suppression::ShownRegistry;
pub use watcher::{PackageWatcherRegistry, RegisterOutcome};
