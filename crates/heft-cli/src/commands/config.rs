use anyhow::{Context, Result};
use clap::Subcommand;
use heft_config::ConfigManager;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Initialize config file at ~/.heft/config.toml
    Init,

    /// Show config file path
    Path,

    /// Print the effective configuration
    Show,

    /// Validate config file
    Validate,
}

pub fn handle_config_command(cmd: ConfigCommand, config: Option<PathBuf>) -> Result<()> {
    let config_path = match config {
        Some(path) => path,
        None => ConfigManager::config_path()?,
    };
    let runtime = Runtime::new().context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        match cmd {
            ConfigCommand::Init => init_config(&config_path).await,
            ConfigCommand::Path => show_config_path(&config_path),
            ConfigCommand::Show => show_config(&config_path).await,
            ConfigCommand::Validate => validate_config(&config_path).await,
        }
    })
}

async fn init_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("To reinitialize, please delete the existing config first.");
        return Ok(());
    }

    ConfigManager::init_at(config_path)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("✓ Initialized config at: {}", config_path.display());
    Ok(())
}

fn show_config_path(config_path: &Path) -> Result<()> {
    println!("{}", config_path.display());
    Ok(())
}

async fn show_config(config_path: &Path) -> Result<()> {
    let manager = ConfigManager::load_or_default(config_path)
        .await
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let rendered = toml::to_string_pretty(manager.config()).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}

async fn validate_config(config_path: &Path) -> Result<()> {
    let manager = ConfigManager::load_from(config_path)
        .await
        .context("Config not found or invalid. Run 'heft config init' first.")?;
    manager.validate().context("Config is invalid")?;

    let config = manager.config();
    println!("✓ Config is valid");
    println!("  Version: {}", config.version);
    println!("  Patterns: {}", config.patterns.iter().count());
    println!("  Registry: {}", config.registry.npm_url);
    Ok(())
}
