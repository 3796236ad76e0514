//! Browser session ports.

use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthGate, DiagnosticsSink, FeedPage, FetchBridge};
use crate::errors::ScrapeResult;

/// Everything one scrape run needs from a connected browser.
pub trait ScrapeSession: FeedPage + FetchBridge + AuthGate + Send + Sync + 'static {
    /// Diagnostics bound to this session. `enabled = false` yields a no-op sink.
    fn diagnostics(&self, enabled: bool) -> Arc<dyn DiagnosticsSink>;
}

/// Creates and tears down browser sessions for a [`SessionLock`].
///
/// [`SessionLock`]: crate::lease::SessionLock
#[async_trait]
pub trait SessionConnector: Send + Sync + 'static {
    type Session: Send + Sync + 'static;

    /// Open a new session.
    async fn connect(&self) -> ScrapeResult<Self::Session>;

    /// Close a session. Failures are logged by the implementation.
    async fn disconnect(&self, session: Self::Session);
}
