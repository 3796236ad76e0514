//! Download command handler.
//!
//! Runs the scroll-download engine in the foreground. Ctrl-C requests
//! cancellation, which the engine observes before its next round.

use lyubitori_core::{ProgressSink, TaskProgress};
use lyubitori_download::{DownloadRequest, RunOutcome};
use tokio_util::sync::CancellationToken;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Prints one line per completed round.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&self, progress: TaskProgress) {
        println!(
            "Round {}: {} images on page, {} new so far",
            progress.scroll_iterations, progress.current_page_images, progress.images_processed
        );
    }
}

pub async fn execute(ctx: &CliContext, max_scroll: u32, no_login: bool) -> Result<(), CliError> {
    let config = ctx.config();
    let mut request = DownloadRequest::new(max_scroll, config.debug_mode);
    if no_login {
        request = request.without_login();
    } else {
        println!("Checking authentication...");
    }

    println!("Starting image scrape (max {max_scroll} scrolls)");
    println!("Images will be saved to: {}", config.save_path.display());
    if config.debug_mode {
        println!("Debug mode enabled - captures will be saved to: {}", config.debug_path.display());
    }
    println!("Target URL: {}", config.likes_url());

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, stopping after the current round...");
                cancel.cancel();
            }
        }
    });

    let service = ctx.download_service();
    let result = service.run(request, &cancel, &ConsoleProgress).await;
    watcher.abort();
    service.session_lock().shutdown().await;

    let summary = result?;
    match summary.outcome {
        RunOutcome::Completed => {
            println!(
                "Scraping completed! Processed {} images ({} saved, {} abandoned)",
                summary.total_new_images, summary.images_saved, summary.items_abandoned
            );
            Ok(())
        }
        RunOutcome::Cancelled => {
            println!(
                "Scraping interrupted by user after {} rounds ({} images processed)",
                summary.rounds_completed, summary.total_new_images
            );
            Ok(())
        }
        RunOutcome::Failed => {
            let error = summary
                .error
                .map_or_else(|| CliError::Core("Scraping failed".to_string()), CliError::from);
            Err(error)
        }
    }
}
