//! Authentication port consumed by the download service.

use async_trait::async_trait;

use crate::errors::ScrapeResult;

#[async_trait]
pub trait AuthGate: Send + Sync {
    /// Make sure the session is logged in, restoring or logging in as needed.
    ///
    /// `Ok(false)` means authentication was attempted and did not succeed.
    async fn ensure_ready(&self) -> ScrapeResult<bool>;

    /// Navigate to the feed to be scraped and let it settle.
    async fn open_feed(&self, url: &str) -> ScrapeResult<()>;

    /// Check the live login state without attempting to log in.
    async fn is_authenticated(&self) -> bool;
}
