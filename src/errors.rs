// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunvisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Pipeline not found: {0}")]
    UnknownPipeline(String),

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Run {0} was already started")]
    AlreadyStarted(String),

    #[error("Run {0} is already registered")]
    DuplicateRun(String),

    #[error("Failed to start runvisor server: {message}")]
    Startup {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response from server: {0}")]
    Protocol(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunvisorError {
    /// Wrap any failure that happens while bringing the server up.
    pub fn startup(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        RunvisorError::Startup {
            message: message.into(),
            source: source.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunvisorError>;
