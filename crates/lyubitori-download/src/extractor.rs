//! One extraction pass over the live feed.

use lyubitori_core::{FeedItem, FeedPage, RoundResult, ScrapeResult};

/// Snapshot every media element on the page into a [`RoundResult`].
///
/// Elements without a `src` are skipped and do not count as viewed. A
/// failure reading `src` fails the whole round so the caller can retry it.
pub async fn extract_round<P: FeedPage>(page: &P) -> ScrapeResult<RoundResult<P::Element>> {
    let elements = page.media_elements().await?;
    let mut round = RoundResult::new();

    for element in elements {
        let Some(url) = page.source_url(&element).await? else {
            continue;
        };
        let link = page.enclosing_link(&element).await;
        round.push(FeedItem::observe(url, link.as_deref()), element);
    }

    tracing::debug!(
        target: "lyubitori.engine",
        viewed = round.viewed_urls.len(),
        items = round.items.len(),
        "Extracted round"
    );
    Ok(round)
}
