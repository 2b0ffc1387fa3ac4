//! Dispatch of session events to the rendering surfaces.

use crate::collaborators::{DecorationRenderer, DiagnosticRenderer};
use crate::suppression::ShownRegistry;
use crate::watcher::PackageWatcherRegistry;
use heft_core::{Category, SessionEvent};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Rendering path of a document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Script, markup and manifest documents: package costs as decorations,
    /// vulnerabilities as diagnostics.
    Packages,
    /// Infrastructure manifests: configuration issues as diagnostics.
    Infrastructure,
}

impl From<Category> for Route {
    fn from(category: Category) -> Self {
        match category {
            Category::TypeScript | Category::JavaScript | Category::Markup | Category::Manifest => {
                Route::Packages
            }
            Category::Infrastructure => Route::Infrastructure,
        }
    }
}

/// Forwards session events; performs no computation of its own.
#[derive(Clone)]
pub struct EventRouter {
    decorations: Arc<dyn DecorationRenderer>,
    diagnostics: Arc<dyn DiagnosticRenderer>,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter").finish_non_exhaustive()
    }
}

impl EventRouter {
    pub fn new(decorations: Arc<dyn DecorationRenderer>, diagnostics: Arc<dyn DiagnosticRenderer>) -> Self {
        Self {
            decorations,
            diagnostics,
        }
    }

    /// Routes one event of a current session for `path`.
    pub fn route(
        &self,
        path: &Path,
        category: Category,
        event: SessionEvent,
        watchers: &mut PackageWatcherRegistry,
        shown: &mut ShownRegistry,
    ) {
        match (Route::from(category), event) {
            (_, SessionEvent::Error(message)) => {
                tracing::warn!(path = %path.display(), error = %message, "analysis error");
            }
            (_, SessionEvent::Package(manifest)) => {
                watchers.register(&manifest);
            }

            (Route::Packages, SessionEvent::Start(packages)) => {
                self.decorations.render_pending(path, &packages);
            }
            (Route::Packages, SessionEvent::Calculated(package)) => {
                self.decorations.render_package(path, &package);
            }
            (Route::Packages, SessionEvent::Done(packages)) => {
                self.decorations.render_final(path, &packages);
                self.diagnostics.render_vulnerabilities(path, &packages, shown);
            }

            (Route::Infrastructure, SessionEvent::Start(_)) => {
                self.diagnostics.clear(path);
                self.diagnostics.decorate_existing(path);
            }
            (Route::Infrastructure, SessionEvent::CalculatedIac(issue)) => {
                self.diagnostics.render_iac_issue(path, &issue, shown);
            }

            (route @ Route::Packages, event @ SessionEvent::CalculatedIac(_))
            | (
                route @ Route::Infrastructure,
                event @ (SessionEvent::Calculated(_) | SessionEvent::Done(_)),
            ) => {
                tracing::trace!(path = %path.display(), ?route, kind = event.kind(), "event has no handler on this route");
            }
        }
    }
}
