//! heft CLI - import cost and vulnerability hints for your editor.

use anyhow::Result;
use clap::Parser;
use heft_cli::commands::{self, CheckOptions};
use heft_cli::logging::init_logging;
use heft_lsp::SetupOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "heft")]
#[command(version, about = "Import cost and vulnerability hints for your editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file path (default: ~/.heft/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Credentials file path (default: ~/.heft/credentials.toml)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace); HEFT_LOG overrides
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run the language server
    Lsp {
        /// Listen on 127.0.0.1:<PORT> instead of stdio
        #[arg(long, value_name = "PORT")]
        tcp: Option<u16>,
    },

    /// Analyze one file and print its package costs or infrastructure issues
    ///
    /// Examples:
    ///   heft check src/index.ts
    ///   heft check k8s/deployment.yaml --json
    Check {
        file: PathBuf,

        /// Language id to classify the file with (guessed from the extension)
        #[arg(long)]
        language_id: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage heft configuration
    Config {
        #[command(subcommand)]
        command: commands::ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let setup = SetupOptions {
        config_path: cli.config.clone(),
        credentials_path: cli.credentials.clone(),
    };

    match cli.command {
        Command::Lsp { tcp } => {
            init_logging(cli.verbose, false);
            commands::handle_lsp_command(setup, tcp)
        }
        Command::Check {
            file,
            language_id,
            json,
        } => {
            init_logging(cli.verbose, true);
            commands::handle_check_command(CheckOptions {
                file,
                language_id,
                json,
                setup,
            })
        }
        Command::Config { command } => commands::handle_config_command(command, cli.config),
    }
}
