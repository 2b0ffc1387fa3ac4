//! Error types for heft core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for heft operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the heft crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A document path is not usable for analysis.
    #[error("Invalid document path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// JSON parsing error (package.json, command arguments, etc.).
    #[error("JSON parse error in {file}: {source}")]
    JsonError {
        /// Path (or logical name) of the JSON input.
        file: PathBuf,
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine-specific error.
    #[error("Engine error ({engine}): {message}")]
    Engine {
        /// Name of the engine that failed.
        engine: String,
        /// Error message from the engine.
        message: String,
    },

    /// Pattern compilation error.
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Unknown editor command.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Command was invoked without a required argument.
    #[error("Command {command} requires argument {argument}")]
    MissingArgument {
        /// The command name.
        command: String,
        /// The missing argument.
        argument: String,
    },
}
