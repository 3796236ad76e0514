//! Download runs as foreground calls or background tasks.
//!
//! Every run holds the browser lease for its whole browser interaction:
//! authentication, navigation and all rounds. Background runs are tokio
//! tasks tracked in the [`TaskRegistry`].

use std::sync::Arc;

use async_trait::async_trait;
use lyubitori_core::{
    AuthGate, ProgressSink, ScrapeError, ScrapeResult, ScrapeSession, ScraperConfig,
    SessionConnector, SessionGuard, SessionLock, TaskId, TaskProgress, TaskRecord, TaskResults,
    TaskStatus,
};
use tokio_util::sync::CancellationToken;

use crate::engine::{EngineConfig, RunOutcome, RunSummary, ScrollDownloadEngine};
use crate::registry::TaskRegistry;

/// Default round cap for a full download.
pub const DEFAULT_MAX_SCROLL: u32 = 100;

/// Default round cap for a refresh of recent likes.
pub const DEFAULT_REFRESH_SCROLL: u32 = 50;

/// Parameters of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadRequest {
    pub max_scroll: u32,
    /// Capture debug screenshots and HTML for this run.
    pub debug: bool,
    /// Authenticate before scraping. Off means the session is trusted as-is.
    pub login: bool,
}

impl DownloadRequest {
    pub const fn new(max_scroll: u32, debug: bool) -> Self {
        Self {
            max_scroll,
            debug,
            login: true,
        }
    }

    #[must_use]
    pub const fn without_login(mut self) -> Self {
        self.login = false;
        self
    }
}

/// Starts background runs. Object-safe so HTTP handlers can hold it as
/// `Arc<dyn TaskLauncher>`.
#[async_trait]
pub trait TaskLauncher: Send + Sync {
    /// Register and spawn a run. Returns the pending record.
    fn launch(&self, request: DownloadRequest) -> TaskRecord;

    fn registry(&self) -> &TaskRegistry;

    /// Live login check on an idle connected browser.
    ///
    /// `None` when no browser is connected or a run holds it.
    async fn check_authentication(&self) -> Option<bool> {
        None
    }
}

/// Whether the run failed in a way that leaves the browser unusable.
fn session_broken(result: &ScrapeResult<RunSummary>) -> bool {
    let error = match result {
        Ok(summary) => summary.error.as_ref(),
        Err(e) => Some(e),
    };
    matches!(error, Some(ScrapeError::Browser(_)))
}

async fn end_lease<C: SessionConnector>(guard: SessionGuard<C>, result: &ScrapeResult<RunSummary>) {
    if session_broken(result) {
        tracing::warn!(target: "lyubitori.browser", "Discarding broken browser session");
        guard.discard().await;
    } else {
        guard.release().await;
    }
}

/// Forwards engine progress into the registry.
struct RegistryProgress {
    registry: TaskRegistry,
    task_id: TaskId,
}

impl ProgressSink for RegistryProgress {
    fn report(&self, progress: TaskProgress) {
        self.registry.update_progress(self.task_id, progress);
    }
}

pub struct DownloadService<C: SessionConnector> {
    lock: SessionLock<C>,
    registry: TaskRegistry,
    config: Arc<ScraperConfig>,
}

impl<C: SessionConnector> Clone for DownloadService<C> {
    fn clone(&self) -> Self {
        Self {
            lock: self.lock.clone(),
            registry: self.registry.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C> DownloadService<C>
where
    C: SessionConnector,
    C::Session: ScrapeSession,
{
    pub const fn new(lock: SessionLock<C>, registry: TaskRegistry, config: Arc<ScraperConfig>) -> Self {
        Self {
            lock,
            registry,
            config,
        }
    }

    pub const fn session_lock(&self) -> &SessionLock<C> {
        &self.lock
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    fn debug_enabled(&self, request: DownloadRequest) -> bool {
        request.debug || self.config.debug_mode
    }

    /// Run to completion in the calling task.
    ///
    /// Authentication failure is an error; engine outcomes, including
    /// `Failed`, come back in the summary.
    pub async fn run(
        &self,
        request: DownloadRequest,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> ScrapeResult<RunSummary> {
        let guard = self.lock.acquire().await?;
        let result = self.run_leased(&guard, request, cancel, progress).await;
        end_lease(guard, &result).await;
        result
    }

    async fn run_leased(
        &self,
        session: &C::Session,
        request: DownloadRequest,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> ScrapeResult<RunSummary> {
        if request.login && !session.ensure_ready().await? {
            return Err(ScrapeError::session("Authentication failed"));
        }

        let likes_url = self.config.likes_url();
        session.open_feed(&likes_url).await?;

        let diagnostics = session.diagnostics(self.debug_enabled(request));
        diagnostics.capture_step("page_loaded", &format!("Loaded {likes_url}")).await;

        let engine = ScrollDownloadEngine::new(EngineConfig::from_scraper(&self.config, request.max_scroll));
        Ok(engine
            .run(session, session, cancel, progress, diagnostics.as_ref())
            .await)
    }

    fn results_for(&self, summary: &RunSummary, request: DownloadRequest) -> TaskResults {
        let debug_enabled = self.debug_enabled(request);
        TaskResults {
            total_images_processed: summary.total_new_images,
            scroll_iterations_completed: summary.rounds_completed,
            images_saved: summary.images_saved,
            items_abandoned: summary.items_abandoned,
            download_path: self.config.save_path.display().to_string(),
            debug_enabled,
            debug_path: debug_enabled.then(|| self.config.debug_path.display().to_string()),
        }
    }

    fn finalize(&self, task_id: TaskId, request: DownloadRequest, result: ScrapeResult<RunSummary>) {
        match result {
            Ok(summary) => {
                let results = self.results_for(&summary, request);
                let (status, error) = match summary.outcome {
                    RunOutcome::Completed => (TaskStatus::Completed, None),
                    RunOutcome::Cancelled => (TaskStatus::Cancelled, None),
                    RunOutcome::Failed => (
                        TaskStatus::Failed,
                        Some(summary.error.map_or_else(|| "run failed".to_string(), |e| e.to_string())),
                    ),
                };
                self.registry.finish(task_id, status, Some(results), error);
            }
            Err(e) => {
                tracing::error!(target: "lyubitori.tasks", task_id = %task_id, error = %e, "Task failed");
                self.registry.fail(task_id, e.to_string());
            }
        }
    }
}

#[async_trait]
impl<C> TaskLauncher for DownloadService<C>
where
    C: SessionConnector,
    C::Session: ScrapeSession,
{
    fn launch(&self, request: DownloadRequest) -> TaskRecord {
        let record = TaskRecord::pending(self.config.likes_url(), request.max_scroll, self.debug_enabled(request));
        let task_id = record.task_id;
        let cancel = self.registry.create(record.clone());
        let service = self.clone();

        let run = tokio::spawn(async move {
            // Queued behind any run that already holds the browser
            let guard = match service.lock.acquire().await {
                Ok(guard) => guard,
                Err(e) => {
                    service.finalize(task_id, request, Err(e));
                    return;
                }
            };
            service.registry.mark_running(task_id);
            tracing::info!(target: "lyubitori.tasks", task_id = %task_id, max_scroll = request.max_scroll, "Task started");

            let progress = RegistryProgress {
                registry: service.registry.clone(),
                task_id,
            };
            let result = service.run_leased(&guard, request, &cancel, &progress).await;
            end_lease(guard, &result).await;
            service.finalize(task_id, request, result);
        });

        // A panicking run never reaches finalize
        let registry = self.registry.clone();
        tokio::spawn(async move {
            if let Err(e) = run.await {
                tracing::error!(target: "lyubitori.tasks", task_id = %task_id, error = %e, "Task aborted");
                registry.fail(task_id, format!("Task aborted: {e}"));
            }
        });

        record
    }

    fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    async fn check_authentication(&self) -> Option<bool> {
        let guard = self.lock.try_acquire_idle()?;
        let authenticated = guard.is_authenticated().await;
        guard.release().await;
        Some(authenticated)
    }
}
