//! Remote lookups used by the engine.

use async_trait::async_trait;
use heft_core::Vulnerability;
use heft_info::{InfoClient, PackageSize};

/// Source of package sizes and advisories.
#[async_trait]
pub trait PackageResolver: Send + Sync {
    /// Size of `name` at `version`, or at the latest version.
    async fn size(&self, name: &str, version: Option<&str>) -> heft_info::Result<PackageSize>;

    /// Advisories for `name@version`.
    async fn vulnerabilities(
        &self,
        token: &str,
        name: &str,
        version: &str,
    ) -> heft_info::Result<Vec<Vulnerability>>;
}

#[async_trait]
impl PackageResolver for InfoClient {
    async fn size(&self, name: &str, version: Option<&str>) -> heft_info::Result<PackageSize> {
        self.package_size(name, version).await
    }

    async fn vulnerabilities(
        &self,
        token: &str,
        name: &str,
        version: &str,
    ) -> heft_info::Result<Vec<Vulnerability>> {
        InfoClient::vulnerabilities(self, token, name, version).await
    }
}
