//! Scrape error taxonomy.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error` or WebDriver command errors. Adapters
//! capture the kind and message as strings at the boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scrape operations.
///
/// Cancellation is not represented here: a cancelled run is a normal
/// terminal outcome, not a fault.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScrapeError {
    /// In-page fetch failed; eligible for bounded retry.
    #[error("Fetch failed for {url}: {message}")]
    TransientFetch {
        /// The URL that was being fetched.
        url: String,
        /// Underlying cause reported by the page.
        message: String,
    },

    /// Downloaded bytes could not be decoded as an image.
    #[error("Decode failed for {identity}: {message}")]
    Decode {
        /// Identity of the item being persisted.
        identity: String,
        /// Decoder message.
        message: String,
    },

    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "`NotFound`", "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// Page navigation or DOM interaction failed.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// The browser session is missing, unauthenticated or unusable.
    #[error("Session error: {0}")]
    Session(String),

    /// Required configuration (credentials etc.) is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The WebDriver endpoint rejected a command or could not be reached.
    #[error("Browser error: {0}")]
    Browser(String),
}

impl ScrapeError {
    /// Create a transient fetch error.
    pub fn transient_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransientFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            identity: identity.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create a navigation error.
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation(message.into())
    }

    /// Create a session error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a browser error.
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser(message.into())
    }

    /// Check if this error may succeed when the same operation is repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientFetch { .. } | Self::Navigation(_) | Self::Browser(_)
        )
    }

    /// Check if this error must stop a run before or during browser work.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Session(_) | Self::Configuration(_))
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::TransientFetch { url, .. } => format!("Could not fetch image {url}"),
            Self::Decode { identity, .. } => format!("Image {identity} could not be decoded"),
            Self::Io { message, .. } => format!("File operation failed: {message}"),
            Self::Navigation(msg) => format!("Page interaction failed: {msg}"),
            Self::Session(msg) => format!("Not logged in: {msg}"),
            Self::Configuration(msg) => format!("Missing configuration: {msg}"),
            Self::Browser(msg) => format!("Browser unavailable: {msg}"),
        }
    }
}

/// Outcome of a failed in-page fetch.
///
/// Script errors, CSP blocks, network failures and aborted navigations all
/// collapse into this one value; callers treat it as transient.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("FETCH_FAILED {url}: {reason}")]
pub struct FetchFailed {
    /// The URL that was being fetched.
    pub url: String,
    /// What the page or driver reported.
    pub reason: String,
}

impl FetchFailed {
    /// Create a fetch failure.
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl From<FetchFailed> for ScrapeError {
    fn from(err: FetchFailed) -> Self {
        Self::TransientFetch {
            url: err.url,
            message: err.reason,
        }
    }
}

/// Convenience result type for scrape operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = ScrapeError::from_io_error(&io_err);

        match err {
            ScrapeError::Io { kind, message } => {
                assert_eq!(kind, "PermissionDenied");
                assert!(message.contains("read-only"));
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_error_serialization() {
        let err = ScrapeError::transient_fetch("https://pbs.twimg.com/media/x", "aborted");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("aborted"));

        let parsed: ScrapeError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_retry_classification() {
        assert!(ScrapeError::transient_fetch("u", "timeout").is_retryable());
        assert!(ScrapeError::navigation("stale element").is_retryable());
        assert!(!ScrapeError::decode("a_1_b", "bad header").is_retryable());
        assert!(!ScrapeError::session("logged out").is_retryable());
        assert!(ScrapeError::configuration("USERNAME").is_fatal());
    }

    #[test]
    fn test_fetch_failed_maps_to_transient() {
        let err: ScrapeError = FetchFailed::new("https://a/b", "csp").into();
        assert!(matches!(err, ScrapeError::TransientFetch { .. }));
        assert!(err.to_string().contains("csp"));
    }
}
