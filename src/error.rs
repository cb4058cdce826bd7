//! Error types for LLM Council
//!
//! Only startup faults live here. Per-model call failures are values
//! (`CallFailure`) and never surface as `Err`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouncilError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No API key configured (looked up {0})")]
    MissingApiKey(String),

    #[error("Concurrency limit must be at least 1")]
    InvalidConcurrency,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Could not write config file: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CouncilError>;
