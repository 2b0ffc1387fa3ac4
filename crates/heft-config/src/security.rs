use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Security-related errors
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Invalid {category} pattern {pattern:?}: {reason}")]
    InvalidPattern {
        category: String,
        pattern: String,
        reason: String,
    },

    #[error("Invalid endpoint URL {0}: {1}")]
    InvalidEndpoint(String, String),

    #[error("Endpoint {0} must use https (credentials are sent to it)")]
    InsecureEndpoint(String),
}

/// Validate a file pattern
///
/// Patterns are regular expressions matched against the document path.
pub fn validate_pattern(category: &str, pattern: &str) -> Result<(), SecurityError> {
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| SecurityError::InvalidPattern {
            category: category.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Validate an endpoint URL
///
/// Endpoints must:
/// - Parse as absolute URLs
/// - Use https, unless they point at a loopback host (local mocks)
pub fn validate_endpoint(endpoint: &str) -> Result<Url, SecurityError> {
    let url = Url::parse(endpoint)
        .map_err(|e| SecurityError::InvalidEndpoint(endpoint.to_string(), e.to_string()))?;

    let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
    if url.scheme() != "https" && !(url.scheme() == "http" && loopback) {
        return Err(SecurityError::InsecureEndpoint(endpoint.to_string()));
    }

    Ok(url)
}

/// Set restrictive permissions on config file (Unix only)
#[cfg(unix)]
pub fn set_config_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600); // rw------- (user read/write only)
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Set config permissions (no-op on Windows for now)
#[cfg(not(unix))]
pub fn set_config_permissions(_path: &Path) -> std::io::Result<()> {
    // Windows: Could use ACLs but that's more complex
    // For now, we rely on the default permissions
    Ok(())
}
