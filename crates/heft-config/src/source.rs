//! Live configuration snapshots.

use crate::types::{ExtensionPatterns, HeftConfig};
use parking_lot::RwLock;
use std::sync::Arc;

/// Provides the current configuration on demand.
///
/// Consumers call [`ConfigSource::patterns`] every time they need the
/// patterns instead of caching them, so edits apply without a restart.
pub trait ConfigSource: Send + Sync {
    /// Snapshot of the current file patterns.
    fn patterns(&self) -> ExtensionPatterns;
}

/// Configuration shared between a host and the pipeline.
///
/// Clones share the same underlying config; [`SharedConfig::replace`] is
/// visible to every clone on its next read.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<HeftConfig>>,
}

impl SharedConfig {
    pub fn new(config: HeftConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Full snapshot of the current config.
    pub fn snapshot(&self) -> HeftConfig {
        self.inner.read().clone()
    }

    /// Replace the whole config.
    pub fn replace(&self, config: HeftConfig) {
        *self.inner.write() = config;
    }

    /// Replace only the file patterns.
    pub fn set_patterns(&self, patterns: ExtensionPatterns) {
        self.inner.write().patterns = patterns;
    }
}

impl ConfigSource for SharedConfig {
    fn patterns(&self) -> ExtensionPatterns {
        self.inner.read().patterns.clone()
    }
}

impl ConfigSource for ExtensionPatterns {
    fn patterns(&self) -> ExtensionPatterns {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_visible_to_clones() {
        let shared = SharedConfig::default();
        let reader = shared.clone();
        assert_eq!(reader.patterns(), ExtensionPatterns::default());

        let mut patterns = ExtensionPatterns::default();
        patterns.html = vec![r"\.vue$".to_string()];
        shared.set_patterns(patterns.clone());

        assert_eq!(reader.patterns(), patterns);
        assert_eq!(reader.snapshot().patterns.html, vec![r"\.vue$"]);
    }
}
