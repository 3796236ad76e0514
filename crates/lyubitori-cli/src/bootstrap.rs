//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter. Command handlers receive the composed context and
//! never build browsers or stores themselves.

use std::sync::Arc;

use lyubitori_browser::{BrowserSession, ChromeConnector};
use lyubitori_core::{ScraperConfig, SessionConnector, SessionLock, SessionStore};
use lyubitori_download::{DownloadService, TaskRegistry};

use crate::error::CliError;
use crate::parser::Cli;

/// Fully composed context for CLI commands.
pub struct CliContext {
    config: Arc<ScraperConfig>,
    store: SessionStore,
}

impl CliContext {
    pub fn new(config: ScraperConfig) -> Self {
        let store = SessionStore::new(config.cookies_file());
        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<ScraperConfig> {
        Arc::clone(&self.config)
    }

    pub const fn session_store(&self) -> &SessionStore {
        &self.store
    }

    /// Start a browser for a single command.
    pub async fn connect(&self) -> Result<BrowserSession, CliError> {
        Ok(ChromeConnector::new(self.shared_config()).connect().await?)
    }

    /// A download service with its own browser lease.
    pub fn download_service(&self) -> DownloadService<ChromeConnector> {
        let config = self.shared_config();
        let lock = SessionLock::new(ChromeConnector::new(Arc::clone(&config)), config.browser_policy);
        DownloadService::new(lock, TaskRegistry::new(), config)
    }
}

/// Load configuration from the environment and apply global flags.
pub fn bootstrap(cli: &Cli) -> Result<CliContext, CliError> {
    let mut config = ScraperConfig::from_env()?;
    if cli.debug {
        config.enable_debug()?;
    }
    config.ensure_directories()?;

    tracing::debug!(
        save_path = %config.save_path.display(),
        session_path = %config.session_path.display(),
        debug_mode = config.debug_mode,
        "CLI bootstrap complete"
    );
    Ok(CliContext::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_context_store_follows_session_path() {
        let dir = tempdir().unwrap();
        let ctx = CliContext::new(ScraperConfig {
            session_path: dir.path().join("state"),
            ..ScraperConfig::default()
        });
        assert_eq!(ctx.session_store().path(), dir.path().join("state").join("cookies.json"));
    }

    #[tokio::test]
    async fn test_download_service_starts_disconnected() {
        let ctx = CliContext::new(ScraperConfig::default());
        let service = ctx.download_service();
        assert!(!service.session_lock().is_connected().await);
    }
}
