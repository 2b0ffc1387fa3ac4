//! Credential persistence.

use crate::manager::{heft_dir, ConfigError};
use crate::security::set_config_permissions;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An API credential obtained through sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    /// Credential created now.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            created_at: Utc::now(),
        }
    }
}

/// Storage for the signed-in credential.
///
/// Operations are synchronous; the credential file is tiny and only touched
/// on sign-in, sign-out and startup.
pub trait CredentialStore: Send + Sync {
    /// The stored credential, if any.
    fn load(&self) -> Option<Credential>;

    /// Persist `credential`, replacing any previous one.
    fn store(&self, credential: Credential) -> Result<(), ConfigError>;

    /// Forget the stored credential.
    fn clear(&self) -> Result<(), ConfigError>;

    /// Whether a credential is stored.
    fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    credential: Option<Credential>,
}

/// Credential store backed by a TOML file (default ~/.heft/credentials.toml).
///
/// The file is written with user-only permissions. The credential is cached
/// in memory after the first read.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cached: Mutex<Option<Option<Credential>>>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Store at the default location
    pub fn default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(heft_dir()?.join("credentials.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Option<Credential> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read credentials");
                return None;
            }
        };

        match toml::from_str::<CredentialFile>(&contents) {
            Ok(file) => file.credential,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed credentials file");
                None
            }
        }
    }

    fn write_file(&self, file: &CredentialFile) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("toml.tmp");
        fs::write(&temp_path, toml::to_string_pretty(file)?)?;
        set_config_permissions(&temp_path)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credential> {
        let mut cached = self.cached.lock();
        cached.get_or_insert_with(|| self.read_file()).clone()
    }

    fn store(&self, credential: Credential) -> Result<(), ConfigError> {
        self.write_file(&CredentialFile {
            credential: Some(credential.clone()),
        })?;
        *self.cached.lock() = Some(Some(credential));
        Ok(())
    }

    fn clear(&self) -> Result<(), ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        *self.cached.lock() = Some(None);
        Ok(())
    }
}

/// In-memory credential store (tests and ephemeral hosts).
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        self.credential.lock().clone()
    }

    fn store(&self, credential: Credential) -> Result<(), ConfigError> {
        *self.credential.lock() = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<(), ConfigError> {
        *self.credential.lock() = None;
        Ok(())
    }
}
