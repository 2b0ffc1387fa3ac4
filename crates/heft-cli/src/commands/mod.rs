pub mod check;
pub mod config;
pub mod lsp;

pub use check::{handle_check_command, run_check, CheckOptions};
pub use config::{handle_config_command, ConfigCommand};
pub use lsp::handle_lsp_command;
