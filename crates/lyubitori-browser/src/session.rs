//! A connected browser implementing the scrape ports.

use std::sync::Arc;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, Locator};
use lyubitori_core::{
    AuthGate, DiagnosticsSink, FeedPage, FetchBridge, FetchFailed, NoopDiagnostics, ScrapeResult,
    ScrapeSession, ScraperConfig, SessionStore,
};

use crate::auth::Authenticator;
use crate::debug::DebugCapture;
use crate::error::BrowserError;
use crate::fetch;

/// Media images in the feed.
pub const MEDIA_XPATH: &str = "//img[@alt='Image']";

/// From an image up to the anchor wrapping it.
pub const ENCLOSING_LINK_XPATH: &str = "../../../..";

const SCROLL_SCRIPT: &str = "arguments[0].scrollIntoView({block: 'end'});";

pub struct BrowserSession {
    client: Client,
    config: Arc<ScraperConfig>,
    store: SessionStore,
}

impl BrowserSession {
    pub fn new(client: Client, config: Arc<ScraperConfig>) -> Self {
        let store = SessionStore::new(config.cookies_file());
        Self {
            client,
            config,
            store,
        }
    }

    pub const fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// An authenticator bound to this session and its saved cookie bundle.
    pub fn authenticator<'a>(&'a self, debug: &'a dyn DiagnosticsSink) -> Authenticator<'a> {
        Authenticator::new(&self.client, &self.config, &self.store, debug)
    }

    /// Quit the browser. Failures are logged.
    pub async fn quit(self) {
        match self.client.close().await {
            Ok(()) => tracing::info!(target: "lyubitori.browser", "WebDriver quit successfully"),
            Err(e) => tracing::warn!(target: "lyubitori.browser", error = %e, "Error quitting WebDriver"),
        }
    }
}

#[async_trait]
impl FeedPage for BrowserSession {
    type Element = Element;

    async fn media_elements(&self) -> ScrapeResult<Vec<Element>> {
        Ok(self
            .client
            .find_all(Locator::XPath(MEDIA_XPATH))
            .await
            .map_err(BrowserError::from)?)
    }

    async fn source_url(&self, element: &Element) -> ScrapeResult<Option<String>> {
        Ok(element.attr("src").await.map_err(BrowserError::from)?)
    }

    async fn enclosing_link(&self, element: &Element) -> Option<String> {
        let anchor = element.find(Locator::XPath(ENCLOSING_LINK_XPATH)).await.ok()?;
        anchor.attr("href").await.ok().flatten()
    }

    async fn scroll_into_view(&self, element: &Element) -> ScrapeResult<()> {
        let arg = serde_json::to_value(element).map_err(BrowserError::from)?;
        self.client
            .execute(SCROLL_SCRIPT, vec![arg])
            .await
            .map_err(BrowserError::from)?;
        Ok(())
    }
}

#[async_trait]
impl FetchBridge for BrowserSession {
    async fn fetch_as_data_url(&self, url: &str) -> Result<String, FetchFailed> {
        fetch::fetch_as_data_url(&self.client, url).await
    }
}

#[async_trait]
impl AuthGate for BrowserSession {
    async fn ensure_ready(&self) -> ScrapeResult<bool> {
        let debug = self.diagnostics(self.config.debug_mode);
        self.authenticator(debug.as_ref()).login(true).await
    }

    async fn open_feed(&self, url: &str) -> ScrapeResult<()> {
        let debug = self.diagnostics(self.config.debug_mode);
        self.authenticator(debug.as_ref()).ensure_page(url).await?;
        tokio::time::sleep(self.config.page_settle).await;
        Ok(())
    }

    async fn is_authenticated(&self) -> bool {
        let debug = NoopDiagnostics::new();
        self.authenticator(&debug).is_logged_in().await
    }
}

impl ScrapeSession for BrowserSession {
    fn diagnostics(&self, enabled: bool) -> Arc<dyn DiagnosticsSink> {
        if enabled {
            Arc::new(DebugCapture::new(self.client.clone(), &self.config))
        } else {
            Arc::new(NoopDiagnostics::new())
        }
    }
}
