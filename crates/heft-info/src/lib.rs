//! npm size, vulnerability and sign-in client for heft
//!
//! This library wraps the three remote services heft talks to: the npm
//! registry (install sizes), the vulnerability API (advisories for a package
//! version) and the browser sign-in handshake.
//!
//! # Example
//!
//! ```no_run
//! use heft_config::HeftConfig;
//! use heft_info::InfoClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InfoClient::from_config(&HeftConfig::default())?;
//!
//!     let lodash = client.package_size("lodash", Some("4.17.21")).await?;
//!     println!("lodash@{} is {} bytes", lodash.version, lodash.size);
//!
//!     println!("{}", client.vuln_page_url("lodash")?);
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod error;
mod npm;
mod types;
mod urls;
mod vulns;

pub use auth::{new_session_token, AuthClient, Authenticator};
pub use client::HttpClient;
pub use error::{Error, Result};
pub use types::{Advisory, PackageSize};
pub use urls::vuln_page_url;

use async_trait::async_trait;
use heft_config::{HeftConfig, RegistrySettings};
use heft_core::{Severity, Vulnerability};
use std::time::Duration;
use url::Url;

/// Main client for the remote services
///
/// Registry and API requests share one rate limiter configured by
/// `registry.requests_per_second`.
#[derive(Debug, Clone)]
pub struct InfoClient {
    http: HttpClient,
    registry: RegistrySettings,
    auth: AuthClient,
}

impl InfoClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::from_config(&HeftConfig::default())
    }

    /// Create a client from a loaded configuration
    pub fn from_config(config: &HeftConfig) -> Result<Self> {
        let http = HttpClient::with_rate_limit(config.registry.requests_per_second)?;
        let auth = AuthClient::new(
            http.clone(),
            config.registry.api_url.clone(),
            config.registry.app_url.clone(),
            Duration::from_secs(config.auth.poll_interval_secs),
            Duration::from_secs(config.auth.timeout_secs),
        );

        Ok(Self {
            http,
            registry: config.registry.clone(),
            auth,
        })
    }

    /// Fetch the unpacked size of `name`; `None` resolves the latest version
    pub async fn package_size(&self, name: &str, version: Option<&str>) -> Result<PackageSize> {
        npm::fetch_package_size(&self.http, &self.registry.npm_url, name, version).await
    }

    /// Fetch raw advisories for `name@version`
    pub async fn advisories(&self, token: &str, name: &str, version: &str) -> Result<Vec<Advisory>> {
        vulns::fetch_vulnerabilities(&self.http, &self.registry.api_url, token, name, version).await
    }

    /// Fetch advisories for `name@version` as heft vulnerabilities
    ///
    /// Unknown severity labels are reported as low.
    pub async fn vulnerabilities(
        &self,
        token: &str,
        name: &str,
        version: &str,
    ) -> Result<Vec<Vulnerability>> {
        let advisories = self.advisories(token, name, version).await?;
        Ok(advisories
            .into_iter()
            .map(|advisory| Vulnerability {
                url: advisory
                    .url
                    .or_else(|| self.vuln_page_url(name).ok().map(String::from)),
                id: advisory.id,
                title: advisory.title,
                severity: Severity::from_label(&advisory.severity),
                package_name: name.to_string(),
                version: version.to_string(),
            })
            .collect())
    }

    /// Public advisory page for `name`
    pub fn vuln_page_url(&self, name: &str) -> Result<Url> {
        urls::vuln_page_url(&self.registry.vuln_registry_url, name)
    }

    /// Sign-in client sharing this client's rate limiter
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }
}

#[async_trait]
impl Authenticator for InfoClient {
    fn login_url(&self, session_token: &str) -> Result<Url> {
        self.auth.login_url(session_token)
    }

    async fn wait_for_token(&self, session_token: &str) -> Result<String> {
        self.auth.wait_for_token(session_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_registry_settings() {
        let mut config = HeftConfig::default();
        config.registry.vuln_registry_url = "https://vulns.example.com".to_string();
        let client = InfoClient::from_config(&config).unwrap();

        assert_eq!(
            client.vuln_page_url("react").unwrap().path(),
            "/test/npm/react"
        );
        assert_eq!(client.vuln_page_url("react").unwrap().host_str(), Some("vulns.example.com"));
    }

    #[test]
    fn test_login_url_delegates() {
        let mut config = HeftConfig::default();
        config.registry.app_url = "https://app.example.com".to_string();
        let client = InfoClient::from_config(&config).unwrap();

        let url = Authenticator::login_url(&client, "tok").unwrap();
        assert_eq!(url.host_str(), Some("app.example.com"));
        assert!(url.query().unwrap_or_default().starts_with("token=tok&"));
    }
}
