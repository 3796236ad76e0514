//! Runtime configuration loaded from the environment.
//!
//! Values come from process environment variables, optionally primed from a
//! `.env` file by the binary. Every numeric value is validated on load; a
//! malformed value is a [`ConfigError`] naming the offending variable rather
//! than a silent fallback.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lease::BrowserPolicy;

/// Front page that every authentication check starts from.
pub const FRONT_PAGE: &str = "https://x.com";

/// Local chromedriver endpoint used when `REMOTE_URL` is unset.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Default HTTP bind address for `serve`.
pub const DEFAULT_API_HOST: &str = "0.0.0.0";

/// Default HTTP port for `serve`.
pub const DEFAULT_API_PORT: u16 = 5000;

/// Name of the cookie file inside the session directory.
pub const COOKIES_FILE_NAME: &str = "cookies.json";

/// Errors produced while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is present but does not parse.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Environment variable name.
        key: String,
        /// The raw value that failed to parse.
        value: String,
    },

    /// A directory required by the scraper could not be created.
    #[error("Failed to create directory {path}: {message}")]
    Directory {
        /// The directory path.
        path: String,
        /// Underlying I/O message.
        message: String,
    },
}

/// Scraper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub backup_code: Option<String>,

    /// WebDriver endpoint. `None` means the local chromedriver.
    pub remote_url: Option<String>,

    /// Wait after login steps and between login verification polls.
    pub login_wait: Duration,
    /// Wait after scrolling the anchor into view.
    pub scroll_delay: Duration,
    /// Attempt budget for both per-item fetches and whole rounds.
    pub max_error_count: u32,
    /// Flat pause between per-item fetch attempts.
    pub retry_delay: Duration,
    /// Pause between whole-round extraction attempts.
    pub round_retry_delay: Duration,
    /// Wait after opening the likes feed before the first round.
    pub page_settle: Duration,

    pub save_path: PathBuf,
    pub session_path: PathBuf,
    pub screenshot_path: PathBuf,
    pub debug_path: PathBuf,
    pub debug_mode: bool,

    pub browser_policy: BrowserPolicy,
    pub api_host: String,
    pub api_port: u16,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            backup_code: None,
            remote_url: None,
            login_wait: Duration::from_secs(15),
            scroll_delay: Duration::from_secs(5),
            max_error_count: 3,
            retry_delay: Duration::from_secs(2),
            round_retry_delay: Duration::ZERO,
            page_settle: Duration::from_secs(10),
            save_path: PathBuf::from("downloaded"),
            session_path: PathBuf::from("session"),
            screenshot_path: PathBuf::from("screenshots"),
            debug_path: PathBuf::from("debug"),
            debug_mode: false,
            browser_policy: BrowserPolicy::Shared,
            api_host: DEFAULT_API_HOST.to_string(),
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl ScraperConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            username: get("USERNAME"),
            password: get("PASSWORD"),
            backup_code: get("BACKUP_CODE"),
            remote_url: get("REMOTE_URL"),
            login_wait: seconds(&get, "LOGIN_WAIT", defaults.login_wait)?,
            scroll_delay: seconds(&get, "SCROLL_DELAY", defaults.scroll_delay)?,
            max_error_count: parsed(&get, "MAX_ERROR_COUNT", defaults.max_error_count)?,
            save_path: get("SAVE_PATH").map_or(defaults.save_path, PathBuf::from),
            session_path: get("SESSION_PATH").map_or(defaults.session_path, PathBuf::from),
            browser_policy: parsed(&get, "BROWSER_POLICY", defaults.browser_policy)?,
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port: parsed(&get, "API_PORT", defaults.api_port)?,
            ..defaults
        })
    }

    /// The likes feed of the configured account.
    pub fn likes_url(&self) -> String {
        format!(
            "{FRONT_PAGE}/{}/likes",
            self.username.as_deref().unwrap_or_default()
        )
    }

    /// Names of credentials required for a fresh login that are missing.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.username.is_none() {
            missing.push("USERNAME");
        }
        if self.password.is_none() {
            missing.push("PASSWORD");
        }
        missing
    }

    /// The WebDriver endpoint to connect to.
    pub fn webdriver_url(&self) -> &str {
        self.remote_url.as_deref().unwrap_or(DEFAULT_WEBDRIVER_URL)
    }

    /// Path of the saved cookie file.
    pub fn cookies_file(&self) -> PathBuf {
        self.session_path.join(COOKIES_FILE_NAME)
    }

    pub fn debug_html_path(&self) -> PathBuf {
        self.debug_path.join("html")
    }

    pub fn debug_screenshots_path(&self) -> PathBuf {
        self.debug_path.join("screenshots")
    }

    /// Create the save, session and screenshot directories.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [&self.save_path, &self.session_path, &self.screenshot_path] {
            create_dir(dir)?;
        }
        Ok(())
    }

    /// Turn debug capture on and create its directories.
    pub fn enable_debug(&mut self) -> Result<(), ConfigError> {
        self.debug_mode = true;
        for dir in [
            self.debug_path.clone(),
            self.debug_html_path(),
            self.debug_screenshots_path(),
        ] {
            create_dir(&dir)?;
        }
        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(path).map_err(|e| ConfigError::Directory {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn parsed<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })
    })
}

fn seconds<G>(get: &G, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ScraperConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ScraperConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.login_wait, Duration::from_secs(15));
        assert_eq!(config.scroll_delay, Duration::from_secs(5));
        assert_eq!(config.max_error_count, 3);
        assert_eq!(config.save_path, PathBuf::from("downloaded"));
        assert_eq!(config.webdriver_url(), DEFAULT_WEBDRIVER_URL);
        assert_eq!(config.browser_policy, BrowserPolicy::Shared);
        assert_eq!(config.api_port, 5000);
    }

    #[test]
    fn test_overrides_parse() {
        let config = config_from(&[
            ("USERNAME", "alice"),
            ("LOGIN_WAIT", "2.5"),
            ("MAX_ERROR_COUNT", "7"),
            ("REMOTE_URL", "http://grid:4444"),
            ("BROWSER_POLICY", "per-run"),
        ])
        .unwrap();

        assert_eq!(config.login_wait, Duration::from_millis(2500));
        assert_eq!(config.max_error_count, 7);
        assert_eq!(config.webdriver_url(), "http://grid:4444");
        assert_eq!(config.browser_policy, BrowserPolicy::PerRun);
        assert_eq!(config.likes_url(), "https://x.com/alice/likes");
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let err = config_from(&[("SCROLL_DELAY", "soon")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "SCROLL_DELAY".to_string(),
                value: "soon".to_string()
            }
        );

        let err = config_from(&[("LOGIN_WAIT", "-1")]).unwrap_err();
        assert!(err.to_string().contains("LOGIN_WAIT"));
    }

    #[test]
    fn test_validate_lists_missing_credentials() {
        assert_eq!(config_from(&[]).unwrap().validate(), vec!["USERNAME", "PASSWORD"]);
        let config = config_from(&[("USERNAME", "a"), ("PASSWORD", "")]).unwrap();
        assert_eq!(config.validate(), vec!["PASSWORD"]);
    }

    #[test]
    fn test_enable_debug_creates_directories() {
        let dir = tempdir().unwrap();
        let mut config = ScraperConfig {
            debug_path: dir.path().join("debug"),
            ..ScraperConfig::default()
        };
        config.enable_debug().unwrap();

        assert!(config.debug_mode);
        assert!(config.debug_html_path().is_dir());
        assert!(config.debug_screenshots_path().is_dir());
    }
}
