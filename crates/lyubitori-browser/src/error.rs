//! Internal error types for WebDriver operations.
//!
//! These errors are internal to `lyubitori-browser` and are mapped to
//! [`ScrapeError`] at the port boundary.

use fantoccini::error::{CmdError, NewSessionError};
use lyubitori_core::ScrapeError;
use thiserror::Error;

/// Result type alias for browser operations.
pub type BrowserResult<T> = Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    /// Could not start a WebDriver session.
    #[error("Failed to start browser session at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: NewSessionError,
    },

    /// TLS setup for the WebDriver client failed.
    #[error("WebDriver client setup failed: {0}")]
    ClientSetup(String),

    /// A WebDriver command failed.
    #[error("WebDriver command failed: {0}")]
    Command(#[from] CmdError),

    /// A page element the flow depends on never appeared.
    #[error("Element not found: {0}")]
    ElementMissing(String),

    /// Local file operation (profile dir, captures) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BrowserError {
    /// The command failed because an element lookup missed.
    pub fn is_missing_element(&self) -> bool {
        match self {
            Self::Command(err) => err.is_no_such_element(),
            Self::ElementMissing(_) => true,
            _ => false,
        }
    }
}

impl From<BrowserError> for ScrapeError {
    fn from(err: BrowserError) -> Self {
        match &err {
            BrowserError::Io(io) => Self::from_io_error(io),
            BrowserError::Connect { .. } | BrowserError::ClientSetup(_) => {
                Self::browser(err.to_string())
            }
            _ if err.is_missing_element() => Self::navigation(err.to_string()),
            _ => Self::browser(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_element_maps_to_navigation() {
        let err: ScrapeError = BrowserError::ElementMissing("//*[text()='Next']".into()).into();
        assert!(matches!(err, ScrapeError::Navigation(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_io_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: ScrapeError = BrowserError::Io(io).into();
        assert!(matches!(err, ScrapeError::Io { .. }));
    }

    #[test]
    fn test_setup_failure_maps_to_browser() {
        let err: ScrapeError = BrowserError::ClientSetup("no roots".into()).into();
        assert!(matches!(err, ScrapeError::Browser(_)));
    }
}
