//! "Already shown" markers for findings presented to the user.

use heft_core::{IacIssue, Vulnerability};
use std::collections::HashSet;
use std::path::Path;

/// Keys of findings already presented, so repeated analysis of the same
/// document does not notify about them again.
///
/// Cleared by a manual recheck and whenever a watched manifest changes.
#[derive(Debug, Default, Clone)]
pub struct ShownRegistry {
    shown: HashSet<String>,
}

impl ShownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of a vulnerability within a document.
    pub fn vulnerability_key(path: &Path, vulnerability: &Vulnerability) -> String {
        format!(
            "{}#{}@{}#{}",
            path.display(),
            vulnerability.package_name,
            vulnerability.version,
            vulnerability.id
        )
    }

    /// Key of an infrastructure issue within a document.
    pub fn iac_key(path: &Path, issue: &IacIssue) -> String {
        format!("{}#{}#{}", path.display(), issue.id, issue.path)
    }

    /// Marks `key` as shown; `true` if it had not been shown before.
    pub fn mark_shown(&mut self, key: impl Into<String>) -> bool {
        self.shown.insert(key.into())
    }

    pub fn is_shown(&self, key: &str) -> bool {
        self.shown.contains(key)
    }

    pub fn clear(&mut self) {
        if !self.shown.is_empty() {
            tracing::debug!(entries = self.shown.len(), "clearing shown findings");
        }
        self.shown.clear();
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}
