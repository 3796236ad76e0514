//! CLI-specific error types and mappings.
//!
//! Maps scraper and configuration errors to exit codes and user-facing
//! messages.

use lyubitori_core::{ConfigError, ScrapeError, SessionStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Any failure without a more specific category.
    #[error("{0}")]
    Core(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The browser could not be started or driven.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Login or session verification failed.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where a category fits.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Core(_) => 1,
            Self::Browser(_) => 69,  // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Auth(_) => 77,     // EX_NOPERM
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<ScrapeError> for CliError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::Configuration(msg) => Self::Config(msg),
            ScrapeError::Session(msg) => Self::Auth(msg),
            ScrapeError::Browser(msg) => Self::Browser(msg),
            ScrapeError::Io { message, .. } => Self::Io(message),
            other => Self::Core(other.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SessionStoreError> for CliError {
    fn from(err: SessionStoreError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::Core(format!("{err:#}"))
    }
}
