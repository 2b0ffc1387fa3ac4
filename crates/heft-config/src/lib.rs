pub mod credentials;
pub mod manager;
pub mod security;
pub mod source;
pub mod types;

pub use credentials::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use manager::{heft_dir, ConfigError, ConfigManager};
pub use security::{set_config_permissions, validate_endpoint, validate_pattern, SecurityError};
pub use source::{ConfigSource, SharedConfig};
pub use types::{AuthSettings, ExtensionPatterns, HeftConfig, RegistrySettings, WatchSettings};
