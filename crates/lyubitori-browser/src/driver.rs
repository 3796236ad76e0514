//! WebDriver session creation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use lyubitori_core::{ScrapeResult, ScraperConfig, SessionConnector};
use serde_json::{Map, Value, json};

use crate::error::{BrowserError, BrowserResult};
use crate::session::BrowserSession;

pub const WINDOW_WIDTH: u32 = 1920;
pub const WINDOW_HEIGHT: u32 = 1080;

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(60);
const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

const CHROME_ARGS: [&str; 6] = [
    "--disable-extensions",
    "--disable-infobars",
    "--enable-automation",
    "--enable-file-cookies",
    "--disable-backgrounding-occluded-windows",
    "--headless",
];

/// Chrome profile directory kept inside the session directory.
pub fn profile_dir(config: &ScraperConfig) -> PathBuf {
    config.session_path.join("chrome_profile")
}

/// W3C capabilities for a headless Chrome with a persistent profile.
pub fn chrome_capabilities(config: &ScraperConfig) -> Map<String, Value> {
    let mut args: Vec<String> = CHROME_ARGS.iter().map(|a| (*a).to_string()).collect();
    args.push(format!("--user-data-dir={}", profile_dir(config).display()));

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

/// Connect to the configured WebDriver endpoint and prepare the window.
pub async fn connect(config: &ScraperConfig) -> BrowserResult<Client> {
    tokio::fs::create_dir_all(profile_dir(config)).await?;

    let url = config.webdriver_url();
    let mut builder =
        ClientBuilder::rustls().map_err(|e| BrowserError::ClientSetup(e.to_string()))?;
    builder.capabilities(chrome_capabilities(config));
    let client = builder
        .connect(url)
        .await
        .map_err(|source| BrowserError::Connect {
            url: url.to_string(),
            source,
        })?;

    client.set_window_size(WINDOW_WIDTH, WINDOW_HEIGHT).await?;
    client
        .update_timeouts(TimeoutConfiguration::new(
            Some(SCRIPT_TIMEOUT),
            Some(PAGE_LOAD_TIMEOUT),
            Some(Duration::ZERO),
        ))
        .await?;

    tracing::info!(target: "lyubitori.browser", %url, "WebDriver session created");
    Ok(client)
}

/// Opens [`BrowserSession`]s for a `SessionLock`.
#[derive(Debug, Clone)]
pub struct ChromeConnector {
    config: Arc<ScraperConfig>,
}

impl ChromeConnector {
    pub const fn new(config: Arc<ScraperConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionConnector for ChromeConnector {
    type Session = BrowserSession;

    async fn connect(&self) -> ScrapeResult<BrowserSession> {
        let client = connect(&self.config).await?;
        Ok(BrowserSession::new(client, Arc::clone(&self.config)))
    }

    async fn disconnect(&self, session: BrowserSession) {
        session.quit().await;
    }
}
