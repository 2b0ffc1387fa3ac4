//! Types returned by the registry and API clients

use serde::{Deserialize, Serialize};

/// Resolved install size of one package version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSize {
    /// Package name as reported by the registry
    pub name: String,
    /// Concrete version the request resolved to
    pub version: String,
    /// Unpacked size in bytes
    pub size: u64,
}

/// One advisory reported for a package version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub id: String,
    pub title: String,
    /// Raw severity label (`low`, `medium`, `high`, `critical`)
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
