//! Saved browser session (cookie bundle) persistence.
//!
//! The bundle is a single JSON array of cookie records. Only the file lives
//! here; replaying cookies into a browser is the browser adapter's job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cookie attributes the browser rejects when they are replayed.
pub const REJECTED_ATTRIBUTES: [&str; 2] = ["sameSite", "staleAt"];

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session file I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file {} is not a valid cookie list: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
}

impl SessionStoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One persisted cookie.
///
/// Unknown fields written by the browser are kept in `extra` so a
/// save/load cycle loses nothing except the rejected attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StoredCookie {
    /// Create a cookie with only a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expiry: None,
            secure: false,
            http_only: false,
            same_site: None,
            extra: BTreeMap::new(),
        }
    }

    /// Drop attributes the browser refuses to accept on replay.
    #[must_use]
    pub fn strip_rejected(mut self) -> Self {
        self.same_site = None;
        for key in REJECTED_ATTRIBUTES {
            self.extra.remove(key);
        }
        self
    }
}

/// File-backed store for the session cookie bundle.
#[derive(Debug, Clone)]
pub struct SessionStore {
    cookies_file: PathBuf,
}

impl SessionStore {
    /// Store backed by `cookies_file`.
    pub fn new(cookies_file: impl Into<PathBuf>) -> Self {
        Self {
            cookies_file: cookies_file.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.cookies_file
    }

    /// Overwrite the bundle with `cookies`.
    pub async fn save(&self, cookies: &[StoredCookie]) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.cookies_file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SessionStoreError::io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(cookies).map_err(|e| SessionStoreError::Malformed {
            path: self.cookies_file.clone(),
            message: e.to_string(),
        })?;
        tokio::fs::write(&self.cookies_file, json)
            .await
            .map_err(|e| SessionStoreError::io(&self.cookies_file, e))?;

        tracing::info!(
            target: "lyubitori.session",
            count = cookies.len(),
            path = %self.cookies_file.display(),
            "Saved session cookies"
        );
        Ok(())
    }

    /// Read the bundle with rejected attributes stripped.
    ///
    /// Returns `None` when no bundle has been saved.
    pub async fn load(&self) -> Result<Option<Vec<StoredCookie>>, SessionStoreError> {
        let bytes = match tokio::fs::read(&self.cookies_file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::io(&self.cookies_file, e)),
        };
        let cookies: Vec<StoredCookie> =
            serde_json::from_slice(&bytes).map_err(|e| SessionStoreError::Malformed {
                path: self.cookies_file.clone(),
                message: e.to_string(),
            })?;
        Ok(Some(
            cookies.into_iter().map(StoredCookie::strip_rejected).collect(),
        ))
    }

    /// A bundle exists and is non-empty.
    pub async fn has_saved(&self) -> bool {
        tokio::fs::metadata(&self.cookies_file)
            .await
            .is_ok_and(|meta| meta.is_file() && meta.len() > 0)
    }

    /// Remove the bundle. Missing files are not an error.
    pub async fn clear(&self) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_file(&self.cookies_file).await {
            Ok(()) => {
                tracing::info!(target: "lyubitori.session", "Cleared saved session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::io(&self.cookies_file, e)),
        }
    }

    /// Last modification time of the bundle.
    pub async fn modified_at(&self) -> Option<DateTime<Utc>> {
        let meta = tokio::fs::metadata(&self.cookies_file).await.ok()?;
        meta.modified().ok().map(DateTime::<Utc>::from)
    }
}
