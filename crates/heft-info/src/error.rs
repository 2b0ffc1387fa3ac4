//! Error types for heft-info

use thiserror::Error;

/// Result type alias for heft-info operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for heft-info operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP request failed with status {status}: {url}")]
    Status { status: u16, url: String },

    /// JSON deserialization failed
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid package name format
    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Package not found in registry
    #[error("Package '{0}' not found in {1} registry")]
    PackageNotFound(String, String),

    /// Registry answered without size information
    #[error("Registry has no size information for {0}")]
    MissingSize(String),

    /// Vulnerability lookups need a credential
    #[error("Not signed in")]
    NotAuthenticated,

    /// Sign-in callback never completed
    #[error("Sign-in timed out after {0} seconds")]
    AuthTimeout(u64),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded for URL: {0}")]
    RateLimitExceeded(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this is a 404 from the remote end
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status { status: 404, .. })
    }
}
