//! In-page fetch port.

use async_trait::async_trait;

use crate::errors::FetchFailed;

/// Fetch a resource from inside the page's script context.
///
/// Requests carry the page's cookies and origin, which is what makes
/// authenticated media reachable at all.
#[async_trait]
pub trait FetchBridge: Send + Sync {
    /// Fetch `url` and return it as a `data:<mime>;base64,<payload>` string.
    async fn fetch_as_data_url(&self, url: &str) -> Result<String, FetchFailed>;
}
