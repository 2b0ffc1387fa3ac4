//! Process-wide cache of resolved package sizes.

use heft_core::CostCache;
use heft_info::PackageSize;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Sizes keyed by `name@version`, or `name@latest` when unpinned.
///
/// Shared by every session; [`CostCache::invalidate`] drops everything, which
/// is what a manifest change or a manual recheck asks for.
#[derive(Debug, Default)]
pub struct SizeCache {
    entries: Mutex<HashMap<String, PackageSize>>,
}

impl SizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(name: &str, version: Option<&str>) -> String {
        format!("{}@{}", name, version.unwrap_or("latest"))
    }

    pub fn get(&self, name: &str, version: Option<&str>) -> Option<PackageSize> {
        self.entries.lock().get(&Self::key(name, version)).cloned()
    }

    pub fn insert(&self, name: &str, version: Option<&str>, size: PackageSize) {
        self.entries.lock().insert(Self::key(name, version), size);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CostCache for SizeCache {
    fn invalidate(&self) {
        let mut entries = self.entries.lock();
        tracing::debug!(entries = entries.len(), "invalidating size cache");
        entries.clear();
    }
}
