//! A collaborator that records every call instead of rendering.
//!
//! Used by the test suites and by hosts that render after the fact (the
//! `heft check` command collects a run, then prints it).

use crate::collaborators::{
    DecorationRenderer, DiagnosticRenderer, Messenger, OutputLog, Telemetry, UrlOpener,
};
use crate::suppression::ShownRegistry;
use heft_core::{IacIssue, PackageInfo};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Pending { path: PathBuf, packages: Vec<PackageInfo> },
    Package { path: PathBuf, package: PackageInfo },
    Final { path: PathBuf, packages: Vec<PackageInfo> },
    ForgetDecorations { path: PathBuf },
    ClearAllDecorations,
    Vulnerabilities {
        path: PathBuf,
        packages: Vec<PackageInfo>,
        /// Keys this call marked as shown
        newly_shown: Vec<String>,
    },
    ClearDiagnostics { path: PathBuf },
    DecorateExisting { path: PathBuf },
    IacIssue { path: PathBuf, issue: IacIssue },
    Track(String),
    Info(String),
    Error(String),
    Append(String),
    Reveal,
    Open(String),
}

impl Call {
    /// Whether this call puts something on a rendering surface.
    pub fn is_render(&self) -> bool {
        matches!(
            self,
            Call::Pending { .. }
                | Call::Package { .. }
                | Call::Final { .. }
                | Call::Vulnerabilities { .. }
                | Call::DecorateExisting { .. }
                | Call::IacIssue { .. }
        )
    }
}

/// Records calls for later inspection.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    /// Snapshot of the calls so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

impl DecorationRenderer for Recorder {
    fn render_pending(&self, path: &Path, packages: &[PackageInfo]) {
        self.push(Call::Pending {
            path: path.to_path_buf(),
            packages: packages.to_vec(),
        });
    }

    fn render_package(&self, path: &Path, package: &PackageInfo) {
        self.push(Call::Package {
            path: path.to_path_buf(),
            package: package.clone(),
        });
    }

    fn render_final(&self, path: &Path, packages: &[PackageInfo]) {
        self.push(Call::Final {
            path: path.to_path_buf(),
            packages: packages.to_vec(),
        });
    }

    fn forget(&self, path: &Path) {
        self.push(Call::ForgetDecorations {
            path: path.to_path_buf(),
        });
    }

    fn clear_all(&self) {
        self.push(Call::ClearAllDecorations);
    }
}

impl DiagnosticRenderer for Recorder {
    fn render_vulnerabilities(&self, path: &Path, packages: &[PackageInfo], shown: &mut ShownRegistry) {
        let newly_shown = packages
            .iter()
            .flat_map(|pkg| &pkg.vulnerabilities)
            .map(|vuln| ShownRegistry::vulnerability_key(path, vuln))
            .filter(|key| shown.mark_shown(key.clone()))
            .collect();
        self.push(Call::Vulnerabilities {
            path: path.to_path_buf(),
            packages: packages.to_vec(),
            newly_shown,
        });
    }

    fn clear(&self, path: &Path) {
        self.push(Call::ClearDiagnostics {
            path: path.to_path_buf(),
        });
    }

    fn decorate_existing(&self, path: &Path) {
        self.push(Call::DecorateExisting {
            path: path.to_path_buf(),
        });
    }

    fn render_iac_issue(&self, path: &Path, issue: &IacIssue, shown: &mut ShownRegistry) {
        shown.mark_shown(ShownRegistry::iac_key(path, issue));
        self.push(Call::IacIssue {
            path: path.to_path_buf(),
            issue: issue.clone(),
        });
    }
}

impl Telemetry for Recorder {
    fn track(&self, action: &str) {
        self.push(Call::Track(action.to_string()));
    }
}

impl Messenger for Recorder {
    fn info(&self, message: &str) {
        self.push(Call::Info(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Call::Error(message.to_string()));
    }
}

impl OutputLog for Recorder {
    fn append(&self, text: &str) {
        self.push(Call::Append(text.to_string()));
    }

    fn reveal(&self) {
        self.push(Call::Reveal);
    }
}

impl UrlOpener for Recorder {
    fn open(&self, url: &Url) -> io::Result<()> {
        self.push(Call::Open(url.to_string()));
        Ok(())
    }
}
