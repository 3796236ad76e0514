//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where the browser adapter, the session
//! lock and the download service are wired together for the web adapter.

use std::sync::Arc;

use anyhow::{Context, Result};
use lyubitori_browser::ChromeConnector;
use lyubitori_core::{ScraperConfig, SessionLock, SessionStore};
use lyubitori_download::{DownloadService, TaskLauncher, TaskRegistry};
use tokio::net::TcpListener;

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Bind address from the scraper configuration.
    pub fn from_scraper(config: &ScraperConfig) -> Self {
        Self {
            host: config.api_host.clone(),
            port: config.api_port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Application context for the Axum adapter.
///
/// Handlers only depend on the launcher trait object, never on the
/// concrete browser connector.
pub struct AxumContext {
    pub launcher: Arc<dyn TaskLauncher>,
    pub session_store: SessionStore,
    pub config: Arc<ScraperConfig>,
}

impl AxumContext {
    pub fn new(launcher: Arc<dyn TaskLauncher>, config: Arc<ScraperConfig>) -> Self {
        Self {
            launcher,
            session_store: SessionStore::new(config.cookies_file()),
            config,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        self.launcher.registry()
    }
}

/// Wire the Chrome-backed download service.
///
/// Returns the context together with the browser lock so the caller can
/// quit the browser on shutdown.
pub fn bootstrap(config: Arc<ScraperConfig>) -> (AxumContext, SessionLock<ChromeConnector>) {
    let lock = SessionLock::new(ChromeConnector::new(Arc::clone(&config)), config.browser_policy);
    let service = DownloadService::new(lock.clone(), TaskRegistry::new(), Arc::clone(&config));

    tracing::info!(
        target: "lyubitori.http",
        save_path = %config.save_path.display(),
        session_path = %config.session_path.display(),
        browser_policy = %config.browser_policy,
        "Axum bootstrap complete"
    );

    (AxumContext::new(Arc::new(service), config), lock)
}

/// Serve the API until Ctrl-C, then quit the browser.
pub async fn start_server(config: Arc<ScraperConfig>, server: ServerConfig) -> Result<()> {
    let addr = server.addr();
    let (ctx, lock) = bootstrap(config);
    let app = crate::routes::create_router(ctx);

    let listener = TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(target: "lyubitori.http", %addr, "lyubitori API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(target: "lyubitori.http", error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!(target: "lyubitori.http", "Shutting down, closing browser");
    lock.shutdown().await;
    Ok(())
}
