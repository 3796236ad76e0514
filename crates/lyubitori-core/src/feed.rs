//! Feed item domain types.
//!
//! Pure functions over the URLs and link targets that the page extractor
//! reads out of the DOM: thumbnail classification, quality upgrade and
//! identity derivation. No I/O, no browser types.

use serde::{Deserialize, Serialize};
use url::Url;

/// URL tokens that mark a small preview variant.
pub const THUMBNAIL_TOKENS: [&str; 2] = ["name=240x240", "name=360x360"];

/// Substitutions that rewrite a media URL to its highest quality variant.
pub const QUALITY_UPGRADES: [(&str, &str); 4] = [
    ("format=jpg", "format=png"),
    ("format=webp", "format=png"),
    ("name=small", "name=large"),
    ("name=900x900", "name=large"),
];

/// One media element observed during a round.
///
/// Created fresh from the live page each round and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Raw URL as rendered by the page.
    pub source_url: String,
    /// `source_url` after quality-upgrade substitutions.
    pub enhanced_url: String,
    /// Stable name used for on-disk deduplication.
    pub identity: String,
    /// Whether the URL encodes a small preview variant.
    pub is_thumbnail: bool,
}

impl FeedItem {
    /// Build an item from its raw URL and the `href` of its enclosing link.
    pub fn observe(source_url: impl Into<String>, link: Option<&str>) -> Self {
        let source_url = source_url.into();
        let enhanced_url = enhance_url(&source_url);
        let identity = derive_identity(&enhanced_url, link);
        let is_thumbnail = is_thumbnail(&source_url);
        Self {
            source_url,
            enhanced_url,
            identity,
            is_thumbnail,
        }
    }
}

/// Check whether a URL is a thumbnail variant.
pub fn is_thumbnail(url: &str) -> bool {
    THUMBNAIL_TOKENS.iter().any(|token| url.contains(token))
}

/// Rewrite format and size tokens to the highest available quality.
pub fn enhance_url(url: &str) -> String {
    QUALITY_UPGRADES
        .iter()
        .fold(url.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Extract the opaque image id: the trailing path segment of the URL.
///
/// Falls back to splitting the raw string when it does not parse as a URL,
/// so the result is deterministic for any input.
pub fn image_id(url: &str) -> String {
    let path = Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or_default().to_string(),
        |parsed| parsed.path().to_string(),
    );
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Parse `/{author}/status/{post_id}[/...]` out of a link target.
///
/// Accepts absolute URLs and bare paths.
pub fn post_context(link: &str) -> Option<(String, String)> {
    let path = Url::parse(link).map_or_else(|_| link.to_string(), |u| u.path().to_string());
    let mut parts = path.split('/');

    // Leading empty segment before the first '/'
    if parts.next() != Some("") {
        return None;
    }
    let author = parts.next().filter(|s| !s.is_empty())?;
    if parts.next() != Some("status") {
        return None;
    }
    let post_id = parts.next().filter(|s| !s.is_empty())?;

    Some((author.to_string(), post_id.to_string()))
}

/// Derive the identity for an image.
///
/// `{author}_{post_id}_{image_id}` when the enclosing link resolves to a
/// post, otherwise `{image_id}` alone.
pub fn derive_identity(url: &str, link: Option<&str>) -> String {
    let img_id = image_id(url);
    match link.and_then(post_context) {
        Some((author, post_id)) => format!("{author}_{post_id}_{img_id}"),
        None => img_id,
    }
}
