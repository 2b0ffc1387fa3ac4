//! Assembly of the production collaborators from a configuration.

use heft_config::{
    ConfigError, ConfigManager, CredentialStore, FileCredentialStore, HeftConfig, SharedConfig,
};
use heft_engine::{HeftEngine, SizeCache};
use heft_fs::{FileSystem, NativeFileSystem, NotifyWatcher};
use heft_info::InfoClient;
use heft_orchestrator::{
    Collaborators, DecorationRenderer, DiagnosticRenderer, Messenger, OutputLog, TracingTelemetry,
    UrlOpener,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("registry client error: {0}")]
    Client(#[from] heft_info::Error),
}

/// Where to read configuration and credentials from.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Defaults to `~/.heft/config.toml`
    pub config_path: Option<PathBuf>,
    /// Defaults to `~/.heft/credentials.toml`
    pub credentials_path: Option<PathBuf>,
}

/// The non-visual collaborators shared by every host.
pub struct Backends {
    pub config: SharedConfig,
    pub engine: Arc<HeftEngine>,
    pub cache: Arc<SizeCache>,
    pub credentials: Arc<dyn CredentialStore>,
    pub info: Arc<InfoClient>,
    pub watcher: Arc<NotifyWatcher>,
}

impl Backends {
    /// Loads the configuration (defaults when the file is missing) and
    /// builds every backend from it.
    pub async fn load(options: &SetupOptions) -> Result<Self, SetupError> {
        let config_path = match &options.config_path {
            Some(path) => path.clone(),
            None => ConfigManager::config_path()?,
        };
        let manager = ConfigManager::load_or_default(&config_path).await?;
        manager.validate()?;

        let credentials: Arc<dyn CredentialStore> = match &options.credentials_path {
            Some(path) => Arc::new(FileCredentialStore::new(path.clone())),
            None => Arc::new(FileCredentialStore::default_location()?),
        };

        Self::from_config(manager.into_config(), credentials)
    }

    pub fn from_config(
        config: HeftConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, SetupError> {
        let info = Arc::new(InfoClient::from_config(&config)?);
        let fs: Arc<dyn FileSystem> = Arc::new(NativeFileSystem::new());
        let engine = HeftEngine::new(info.clone(), credentials.clone(), fs);
        let cache = engine.cache();
        let watcher = Arc::new(if config.watch.poll {
            NotifyWatcher::polling(Duration::from_millis(config.watch.poll_interval_ms))
        } else {
            NotifyWatcher::native()
        });

        tracing::debug!(
            npm = %config.registry.npm_url,
            api = %config.registry.api_url,
            "backends ready"
        );

        Ok(Self {
            config: SharedConfig::new(config),
            engine: Arc::new(engine),
            cache,
            credentials,
            info,
            watcher,
        })
    }

    /// Wires the backends to a host's rendering surface.
    pub fn collaborators<S>(&self, surface: Arc<S>) -> Collaborators
    where
        S: DecorationRenderer + DiagnosticRenderer + Messenger + OutputLog + UrlOpener + 'static,
    {
        Collaborators {
            engine: self.engine.clone(),
            cache: self.cache.clone(),
            config: Arc::new(self.config.clone()),
            credentials: self.credentials.clone(),
            watcher: self.watcher.clone(),
            authenticator: self.info.clone(),
            decorations: surface.clone(),
            diagnostics: surface.clone(),
            telemetry: Arc::new(TracingTelemetry),
            messenger: surface.clone(),
            output: surface.clone(),
            opener: surface,
            vuln_registry_url: self.config.snapshot().registry.vuln_registry_url,
        }
    }
}
