//! Round-over-round state for the scroll-download engine.

use std::collections::HashSet;

use crate::feed::FeedItem;

/// Output of one extraction pass over the live page.
///
/// Generic over the adapter's element handle so the anchor can be handed
/// back to the page for scrolling.
#[derive(Debug, Clone)]
pub struct RoundResult<E> {
    /// Every raw URL seen this round, thumbnails included.
    pub viewed_urls: HashSet<String>,
    /// Items in document order, deduplicated by raw URL.
    pub items: Vec<FeedItem>,
    /// Last non-thumbnail element, used to drive the next scroll.
    pub scroll_anchor: Option<E>,
}

impl<E> RoundResult<E> {
    /// Create an empty round.
    pub fn new() -> Self {
        Self {
            viewed_urls: HashSet::new(),
            items: Vec::new(),
            scroll_anchor: None,
        }
    }

    /// Record an observed element.
    ///
    /// The anchor follows document order even for repeated URLs. Returns
    /// `false` when the raw URL was already seen this round.
    pub fn push(&mut self, item: FeedItem, element: E) -> bool {
        if !item.is_thumbnail {
            self.scroll_anchor = Some(element);
        }
        if !self.viewed_urls.insert(item.source_url.clone()) {
            return false;
        }
        self.items.push(item);
        true
    }
}

impl<E> Default for RoundResult<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine-owned mutable state carried across rounds.
///
/// Exhaustion compares only against the immediately preceding round, never
/// against an accumulated history.
#[derive(Debug, Clone, Default)]
pub struct DownloadState {
    /// Raw URLs seen in the preceding round only.
    pub previous_urls: HashSet<String>,
    /// Running sum of per-round new URL counts.
    pub total_new_images: u64,
    /// Completed rounds.
    pub round_index: u32,
}

impl DownloadState {
    /// Create a fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs in `viewed` that the previous round did not contain.
    pub fn new_count(&self, viewed: &HashSet<String>) -> u64 {
        viewed.difference(&self.previous_urls).count() as u64
    }

    /// The round contributed nothing new: `|viewed ∪ previous| == |previous|`.
    pub fn is_exhausted(&self, viewed: &HashSet<String>) -> bool {
        viewed.union(&self.previous_urls).count() == self.previous_urls.len()
    }

    /// Accumulate a finished round and make it the new comparison baseline.
    ///
    /// Returns the number of new URLs the round contributed.
    pub fn absorb(&mut self, viewed: HashSet<String>) -> u64 {
        let added = self.new_count(&viewed);
        self.total_new_images += added;
        self.previous_urls = viewed;
        added
    }
}
