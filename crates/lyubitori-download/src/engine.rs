//! The incremental scroll-and-download loop.
//!
//! Each round extracts the visible media, downloads whatever is not yet on
//! disk, then scrolls the last non-thumbnail element into view so the page
//! lazy-loads the next batch. The run ends when a round contributes no URL
//! the previous round did not already have, when the round cap is reached,
//! when cancellation is observed at the top of a round, or when extraction
//! keeps failing past its retry budget.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lyubitori_core::{
    DiagnosticsSink, DownloadState, FeedItem, FeedPage, FetchBridge, ProgressSink, RetryError,
    RetryPolicy, ScrapeError, ScraperConfig, TaskProgress,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::codec::{self, ImageCodec, PersistOutcome};
use crate::extractor::extract_round;

/// Tunables for one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub output_dir: PathBuf,
    /// Upper bound on completed rounds.
    pub max_rounds: u32,
    /// Attempt budget for per-item fetches and for whole rounds.
    pub max_error_count: u32,
    pub scroll_delay: Duration,
    pub retry_delay: Duration,
    pub round_retry_delay: Duration,
}

impl EngineConfig {
    pub fn from_scraper(config: &ScraperConfig, max_rounds: u32) -> Self {
        Self {
            output_dir: config.save_path.clone(),
            max_rounds,
            max_error_count: config.max_error_count,
            scroll_delay: config.scroll_delay,
            retry_delay: config.retry_delay,
            round_retry_delay: config.round_retry_delay,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// What a run accomplished. Partial progress is kept for every outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    /// Sum over rounds of URLs the previous round did not contain.
    pub total_new_images: u64,
    pub rounds_completed: u32,
    /// Files newly written or upgraded.
    pub images_saved: u64,
    /// Items given up on after fetch retries or a codec failure.
    pub items_abandoned: u64,
    /// Set when `outcome` is `Failed`.
    pub error: Option<ScrapeError>,
}

impl RunSummary {
    pub fn completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Saved,
    Skipped,
    Abandoned,
}

#[derive(Debug, Default)]
struct Tally {
    saved: u64,
    abandoned: u64,
}

pub struct ScrollDownloadEngine {
    config: EngineConfig,
    codec: ImageCodec,
}

impl ScrollDownloadEngine {
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
            codec: ImageCodec::new(),
        }
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Run rounds until the feed is exhausted, the cap is hit, the token is
    /// cancelled or a round fails past its retry budget.
    pub async fn run<P, B>(
        &self,
        page: &P,
        bridge: &B,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
        diagnostics: &dyn DiagnosticsSink,
    ) -> RunSummary
    where
        P: FeedPage,
        B: FetchBridge,
    {
        let max_rounds = self.config.max_rounds;
        let mut state = DownloadState::new();
        let mut tally = Tally::default();

        tracing::info!(target: "lyubitori.engine", max_rounds, "Starting scroll download");
        diagnostics.log_action("Starting scroll download", &format!("max_scroll={max_rounds}"));
        diagnostics
            .capture_step("scroll_start", &format!("Beginning scroll download with max_scroll={max_rounds}"))
            .await;

        let round_policy = RetryPolicy::new(self.config.max_error_count, self.config.round_retry_delay);

        let (outcome, error) = loop {
            if state.round_index >= max_rounds {
                tracing::info!(
                    target: "lyubitori.engine",
                    total = state.total_new_images,
                    "Completed all scroll iterations"
                );
                diagnostics
                    .capture_step(
                        "scroll_complete",
                        &format!(
                            "Completed all {} scroll iterations, {} images processed",
                            state.round_index, state.total_new_images
                        ),
                    )
                    .await;
                break (RunOutcome::Completed, None);
            }
            // The cap wins over a cancel that arrived during the last round
            if cancel.is_cancelled() {
                tracing::info!(target: "lyubitori.engine", round = state.round_index, "Cancellation observed");
                break (RunOutcome::Cancelled, None);
            }

            let round_no = state.round_index + 1;
            tracing::info!(target: "lyubitori.engine", round = round_no, max_rounds, "Scroll iteration");
            diagnostics.log_action("Scroll iteration", &format!("{round_no}/{max_rounds}"));

            let extracted = round_policy
                .run(
                    |attempt| async move {
                        let result = extract_round(page).await;
                        if let Err(e) = &result {
                            tracing::warn!(
                                target: "lyubitori.engine",
                                round = round_no,
                                attempt,
                                error = %e,
                                "Error in scroll iteration"
                            );
                            diagnostics.capture_error("scroll_iteration_error", &e.to_string()).await;
                        }
                        result
                    },
                    |e: &ScrapeError| !e.is_fatal(),
                )
                .await;

            let round = match extracted {
                Ok(round) => round,
                Err(err) => {
                    let attempts = err.attempts();
                    let error = err.into_inner();
                    tracing::error!(
                        target: "lyubitori.engine",
                        round = round_no,
                        attempts,
                        error = %error,
                        "Max errors reached in scroll iteration"
                    );
                    diagnostics.capture_error("max_errors_reached", &error.to_string()).await;
                    break (RunOutcome::Failed, Some(error));
                }
            };

            tracing::info!(target: "lyubitori.engine", round = round_no, found = round.viewed_urls.len(), "Found images on page");

            if state.is_exhausted(&round.viewed_urls) {
                tracing::info!(target: "lyubitori.engine", round = round_no, "No new images found, reached end of timeline");
                diagnostics.capture_step("timeline_end", "No new content found, reached end").await;
                break (RunOutcome::Completed, None);
            }

            diagnostics.log_action("Downloading visible images", &format!("{} items", round.items.len()));
            for item in &round.items {
                match self.download_item(item, bridge, diagnostics).await {
                    ItemOutcome::Saved => tally.saved += 1,
                    ItemOutcome::Skipped => {}
                    ItemOutcome::Abandoned => tally.abandoned += 1,
                }
            }

            let current_page_images = round.viewed_urls.len() as u64;
            let added = state.absorb(round.viewed_urls);
            diagnostics.log_action("Progress update", &format!("Total downloaded: {}", state.total_new_images));
            tracing::debug!(target: "lyubitori.engine", round = round_no, added, total = state.total_new_images, "Round absorbed");

            if let Some(anchor) = &round.scroll_anchor {
                match page.scroll_into_view(anchor).await {
                    Ok(()) => {
                        tokio::time::sleep(self.config.scroll_delay).await;
                        diagnostics
                            .capture_step(&format!("scroll_{round_no}"), &format!("Scrolled down in iteration {round_no}"))
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(target: "lyubitori.engine", round = round_no, error = %e, "Scroll error");
                        diagnostics.capture_error("scroll_error", &e.to_string()).await;
                    }
                }
            }

            state.round_index += 1;
            progress.report(TaskProgress {
                images_processed: state.total_new_images,
                scroll_iterations: state.round_index,
                current_page_images,
            });
        };

        diagnostics.write_summary().await;
        tracing::info!(
            target: "lyubitori.engine",
            outcome = ?outcome,
            total = state.total_new_images,
            rounds = state.round_index,
            saved = tally.saved,
            abandoned = tally.abandoned,
            "Scroll download finished"
        );

        RunSummary {
            outcome,
            total_new_images: state.total_new_images,
            rounds_completed: state.round_index,
            images_saved: tally.saved,
            items_abandoned: tally.abandoned,
            error,
        }
    }

    /// Fetch and persist one item unless its identity is already on disk.
    async fn download_item<B: FetchBridge>(
        &self,
        item: &FeedItem,
        bridge: &B,
        diagnostics: &dyn DiagnosticsSink,
    ) -> ItemOutcome {
        if let Some(path) = codec::existing_file(self.output_dir(), &item.identity) {
            tracing::debug!(target: "lyubitori.engine", path = %path.display(), "Image already exists");
            return ItemOutcome::Skipped;
        }

        let max = self.config.max_error_count;
        let policy = RetryPolicy::new(max, self.config.retry_delay);
        let url = item.enhanced_url.as_str();
        let identity = item.identity.as_str();

        let fetched = policy
            .run(
                |attempt| async move {
                    diagnostics.log_action("Downloading image", &format!("Fetching {identity}"));
                    let result = bridge.fetch_as_data_url(url).await;
                    if let Err(e) = &result {
                        if attempt < max {
                            tracing::warn!(target: "lyubitori.engine", %url, attempt, max, error = %e, "Retrying fetch");
                        }
                    }
                    result
                },
                |_| true,
            )
            .await;

        let data_url = match fetched {
            Ok(data_url) => data_url,
            Err(RetryError::Exhausted { attempts, last } | RetryError::Permanent { attempt: attempts, error: last }) => {
                tracing::error!(
                    target: "lyubitori.engine",
                    %url,
                    attempts,
                    error = %last,
                    "Failed to download after retries"
                );
                diagnostics
                    .capture_error("download_failed", &format!("Failed to download {url}: {last}"))
                    .await;
                return ItemOutcome::Abandoned;
            }
        };

        diagnostics.log_action("Image fetched", &format!("Successfully fetched {identity}"));
        match self.codec.persist(identity, data_url, self.output_dir()).await {
            Ok(PersistOutcome::Persisted(_)) => ItemOutcome::Saved,
            Ok(PersistOutcome::Skipped(_)) => ItemOutcome::Skipped,
            Err(e) => {
                tracing::error!(target: "lyubitori.engine", identity, error = %e, "Failed to save image");
                diagnostics.capture_error("persist_failed", &e.to_string()).await;
                ItemOutcome::Abandoned
            }
        }
    }
}
