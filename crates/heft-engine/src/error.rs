//! Engine error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid package.json: {0}")]
    Manifest(#[source] serde_json::Error),

    #[error("Invalid YAML document starting at line {}: {source}", .line + 1)]
    Yaml {
        line: u32,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{package}: {source}")]
    Lookup {
        package: String,
        #[source]
        source: heft_info::Error,
    },
}
