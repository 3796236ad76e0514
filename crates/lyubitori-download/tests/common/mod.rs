//! Shared fakes for engine and service tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgb, RgbImage};
use lyubitori_core::{FeedPage, FetchBridge, FetchFailed, ScrapeError, ScrapeResult};
use lyubitori_download::EngineConfig;
use tokio_util::sync::CancellationToken;

/// A PNG of the given size as a data URL.
pub fn png_data_url(width: u32, height: u32) -> String {
    let img = RgbImage::from_pixel(width, height, Rgb([1, 2, 3]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(out.into_inner()))
}

/// Raw media URL for an image id, as the feed renders it.
pub fn media(id: &str) -> String {
    format!("https://pbs.twimg.com/media/{id}?format=jpg&name=small")
}

pub fn thumbnail(id: &str) -> String {
    format!("https://pbs.twimg.com/media/{id}?format=jpg&name=240x240")
}

/// The URL the engine fetches for `media(id)`.
pub fn enhanced(id: &str) -> String {
    format!("https://pbs.twimg.com/media/{id}?format=png&name=large")
}

pub fn engine_config(dir: &Path, max_rounds: u32) -> EngineConfig {
    EngineConfig {
        output_dir: dir.to_path_buf(),
        max_rounds,
        max_error_count: 3,
        scroll_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        round_retry_delay: Duration::ZERO,
    }
}

#[derive(Debug, Clone)]
pub struct FakeImg {
    pub src: Option<String>,
    pub link: Option<String>,
}

impl FakeImg {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            link: None,
        }
    }

    pub fn in_post(src: impl Into<String>, link: &str) -> Self {
        Self {
            src: Some(src.into()),
            link: Some(link.to_string()),
        }
    }

    pub const fn without_src() -> Self {
        Self {
            src: None,
            link: None,
        }
    }
}

/// A feed that shows one snapshot per scroll position.
///
/// Scrolling advances to the next snapshot; past the last one the page
/// keeps showing the last snapshot.
pub struct FakePage {
    snapshots: Vec<Vec<FakeImg>>,
    cursor: AtomicUsize,
    failures_left: AtomicU32,
    cancel_on_scroll: Option<CancellationToken>,
    pub extractions: AtomicU32,
    pub scrolls: AtomicU32,
}

impl FakePage {
    pub fn new(snapshots: Vec<Vec<FakeImg>>) -> Self {
        Self {
            snapshots,
            cursor: AtomicUsize::new(0),
            failures_left: AtomicU32::new(0),
            cancel_on_scroll: None,
            extractions: AtomicU32::new(0),
            scrolls: AtomicU32::new(0),
        }
    }

    /// The same snapshot at every scroll position.
    pub fn fixed(images: Vec<FakeImg>) -> Self {
        Self::new(vec![images])
    }

    /// A fresh, never repeating image at every scroll position.
    pub fn endless(positions: usize) -> Self {
        Self::new(
            (0..positions)
                .map(|i| vec![FakeImg::new(media(&format!("endless{i}")))])
                .collect(),
        )
    }

    #[must_use]
    pub fn failing_extractions(self, count: u32) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn cancel_on_scroll(mut self, token: CancellationToken) -> Self {
        self.cancel_on_scroll = Some(token);
        self
    }

    fn current(&self) -> &[FakeImg] {
        let last = self.snapshots.len().saturating_sub(1);
        let index = self.cursor.load(Ordering::SeqCst).min(last);
        self.snapshots.get(index).map_or(&[], Vec::as_slice)
    }
}

#[async_trait]
impl FeedPage for FakePage {
    type Element = usize;

    async fn media_elements(&self) -> ScrapeResult<Vec<usize>> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ScrapeError::navigation("stale element reference"));
        }
        Ok((0..self.current().len()).collect())
    }

    async fn source_url(&self, element: &usize) -> ScrapeResult<Option<String>> {
        Ok(self.current().get(*element).and_then(|img| img.src.clone()))
    }

    async fn enclosing_link(&self, element: &usize) -> Option<String> {
        self.current().get(*element).and_then(|img| img.link.clone())
    }

    async fn scroll_into_view(&self, _element: &usize) -> ScrapeResult<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        self.cursor.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_scroll {
            token.cancel();
        }
        Ok(())
    }
}

/// Serves the same PNG for every URL and records what was asked for.
pub struct FakeBridge {
    payload: String,
    calls: Mutex<Vec<String>>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self {
            payload: png_data_url(4, 4),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchBridge for FakeBridge {
    async fn fetch_as_data_url(&self, url: &str) -> Result<String, FetchFailed> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self.payload.clone())
    }
}
