//! Live feed page port.

use async_trait::async_trait;

use crate::errors::ScrapeResult;

/// Read and scroll access to the rendered feed.
///
/// `Element` is whatever handle the adapter uses for a DOM node. It must be
/// cheap to clone since the extractor keeps the last one as scroll anchor.
#[async_trait]
pub trait FeedPage: Send + Sync {
    type Element: Clone + Send + Sync;

    /// Every media image currently attached to the page, in document order.
    async fn media_elements(&self) -> ScrapeResult<Vec<Self::Element>>;

    /// The element's `src` attribute. `Ok(None)` when it has none.
    async fn source_url(&self, element: &Self::Element) -> ScrapeResult<Option<String>>;

    /// `href` of the anchor that encloses the image, if one can be found.
    ///
    /// Lookup failures are swallowed; identity falls back to the image id.
    async fn enclosing_link(&self, element: &Self::Element) -> Option<String>;

    /// Scroll the element into the viewport.
    async fn scroll_into_view(&self, element: &Self::Element) -> ScrapeResult<()>;
}
