use crate::security::{set_config_permissions, validate_endpoint, validate_pattern, SecurityError};
use crate::types::HeftConfig;
use heft_fs::{FileSystem, NativeFileSystem};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Directory holding heft's config and credentials (~/.heft)
pub fn heft_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(home.join(".heft"))
}

/// Manager for heft configuration
///
/// Manages the configuration stored in ~/.heft/config.toml.
pub struct ConfigManager<F: FileSystem = NativeFileSystem> {
    fs: Arc<F>,
    config_path: PathBuf,
    config: HeftConfig,
}

impl ConfigManager {
    /// Get the default config path (~/.heft/config.toml)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(heft_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub async fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path).await
    }

    /// Load config from specific path (useful for testing)
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_filesystem(Arc::new(NativeFileSystem::new()), path).await
    }

    /// Load config from `path`, falling back to defaults when the file is missing
    pub async fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load_from(path).await {
            Err(ConfigError::ConfigNotFound(_)) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self {
                    fs: Arc::new(NativeFileSystem::new()),
                    config_path: path.to_path_buf(),
                    config: HeftConfig::default(),
                })
            }
            other => other,
        }
    }

    /// Initialize a new config file
    pub async fn init() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::init_at(&config_path).await
    }

    /// Initialize config at specific path
    pub async fn init_at(path: &Path) -> Result<Self, ConfigError> {
        let manager = Self {
            fs: Arc::new(NativeFileSystem::new()),
            config_path: path.to_path_buf(),
            config: HeftConfig::default(),
        };

        if let Some(parent) = path.parent() {
            manager.fs.create_dir_all(parent).await?;
        }
        manager.save().await?;

        Ok(manager)
    }
}

impl<F: FileSystem> ConfigManager<F> {
    /// Load config with a custom FileSystem
    pub async fn load_with_filesystem(fs: Arc<F>, path: &Path) -> Result<Self, ConfigError> {
        if !fs.exists(path).await? {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = fs.read_to_string(path).await?;
        let config: HeftConfig = toml::from_str(&contents)?;

        Ok(Self {
            fs,
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Save config to disk atomically
    ///
    /// Uses a temporary file and atomic rename to prevent corruption
    pub async fn save(&self) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(&self.config)?;

        let temp_path = self.config_path.with_extension("toml.tmp");
        self.fs.write(&temp_path, &toml_str).await?;

        // Only meaningful for real files; the in-memory filesystem has no permissions
        if temp_path.exists() {
            set_config_permissions(&temp_path)?;
        }

        self.fs.rename(&temp_path, &self.config_path).await?;

        Ok(())
    }

    /// Check every pattern compiles and every endpoint is acceptable
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (category, pattern) in self.config.patterns.iter() {
            validate_pattern(category, pattern)?;
        }

        let registry = &self.config.registry;
        for endpoint in [
            &registry.npm_url,
            &registry.vuln_registry_url,
            &registry.api_url,
            &registry.app_url,
        ] {
            validate_endpoint(endpoint)?;
        }

        Ok(())
    }

    /// Path this manager reads from and saves to
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get reference to config
    pub fn config(&self) -> &HeftConfig {
        &self.config
    }

    /// Get mutable reference to config (caller must call save())
    pub fn config_mut(&mut self) -> &mut HeftConfig {
        &mut self.config
    }

    /// Consume the manager, keeping only the config
    pub fn into_config(self) -> HeftConfig {
        self.config
    }
}
