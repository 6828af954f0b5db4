//! Error types for the trialsim_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for trialsim_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid run or protocol configuration (unknown arm, missing
    /// session type, empty cohort). Always fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output file could not be finalised
    #[error("Output error: {0}")]
    Output(String),
}

impl Error {
    /// Returns true for configuration mistakes, as opposed to I/O failures.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
