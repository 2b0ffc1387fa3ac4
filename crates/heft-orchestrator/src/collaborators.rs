//! Surfaces the orchestrator drives but does not implement.
//!
//! Rendering, messaging and telemetry belong to the host (an LSP server, the
//! CLI, a test harness). All methods are synchronous and called from the
//! orchestrator's event loop; hosts that need async I/O spawn it themselves.

use crate::suppression::ShownRegistry;
use heft_config::{ConfigSource, CredentialStore};
use heft_core::{AnalysisEngine, CostCache, IacIssue, PackageInfo};
use heft_fs::FileWatcher;
use heft_info::Authenticator;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Inline cost annotations next to imports.
pub trait DecorationRenderer: Send + Sync {
    /// Unresolved packages, shown as soon as a session starts.
    fn render_pending(&self, path: &Path, packages: &[PackageInfo]);

    /// One package resolved.
    fn render_package(&self, path: &Path, package: &PackageInfo);

    /// Final package list for the session.
    fn render_final(&self, path: &Path, packages: &[PackageInfo]);

    /// Remove the decorations of one document.
    fn forget(&self, path: &Path);

    /// Remove every decoration in every document.
    fn clear_all(&self);
}

/// Diagnostics (problems) attached to documents.
pub trait DiagnosticRenderer: Send + Sync {
    /// Vulnerability diagnostics for the final package list.
    ///
    /// `shown` holds the findings already presented to the user; renderers
    /// mark what they notify about.
    fn render_vulnerabilities(&self, path: &Path, packages: &[PackageInfo], shown: &mut ShownRegistry);

    /// Remove every diagnostic of `path`, with the decorations marking them.
    fn clear(&self, path: &Path);

    /// Re-decorate `path` from the diagnostics it currently has.
    fn decorate_existing(&self, path: &Path);

    /// One infrastructure issue: diagnostic plus decoration.
    ///
    /// Like [`render_vulnerabilities`](Self::render_vulnerabilities), marks
    /// the issue in `shown` when notifying about it.
    fn render_iac_issue(&self, path: &Path, issue: &IacIssue, shown: &mut ShownRegistry);
}

/// Usage statistics. Best effort; implementations must not fail.
pub trait Telemetry: Send + Sync {
    fn track(&self, action: &str);
}

/// User-visible notifications.
pub trait Messenger: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// The log surface `showOutput` reveals.
pub trait OutputLog: Send + Sync {
    fn append(&self, text: &str);
    fn reveal(&self);
}

/// Opens external links (browser).
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &Url) -> io::Result<()>;
}

/// Telemetry that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn track(&self, action: &str) {
        tracing::debug!(action, "telemetry");
    }
}

/// Everything an [`Orchestrator`](crate::Orchestrator) talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub engine: Arc<dyn AnalysisEngine>,
    pub cache: Arc<dyn CostCache>,
    pub config: Arc<dyn ConfigSource>,
    pub credentials: Arc<dyn CredentialStore>,
    pub watcher: Arc<dyn FileWatcher>,
    pub authenticator: Arc<dyn Authenticator>,
    pub decorations: Arc<dyn DecorationRenderer>,
    pub diagnostics: Arc<dyn DiagnosticRenderer>,
    pub telemetry: Arc<dyn Telemetry>,
    pub messenger: Arc<dyn Messenger>,
    pub output: Arc<dyn OutputLog>,
    pub opener: Arc<dyn UrlOpener>,
    /// Base of the public advisory pages (`openVulnPage`)
    pub vuln_registry_url: String,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("engine", &self.engine)
            .field("vuln_registry_url", &self.vuln_registry_url)
            .finish_non_exhaustive()
    }
}
