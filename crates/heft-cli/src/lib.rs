//! heft CLI library components.
//!
//! The `heft` binary runs the language server, checks single files from the
//! terminal and manages `~/.heft/config.toml`. The main binary is in
//! `main.rs`.

pub mod commands;
pub mod formatters;
pub mod logging;

pub use formatters::CheckReport;
