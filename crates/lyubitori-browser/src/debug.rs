//! Debug capture of page state.
//!
//! Each capture writes a screenshot, a metadata file and the page source
//! annotated with URL, title and timestamp. Nothing here ever fails the
//! caller: every error is logged at warn level and dropped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Local;
use fantoccini::Client;
use lyubitori_core::{DiagnosticsSink, ScraperConfig};

use crate::error::BrowserResult;

pub const SUMMARY_FILE_NAME: &str = "debug_summary.txt";

/// File name stem for a numbered step capture.
pub fn step_prefix(step: u32, timestamp: &str, name: &str) -> String {
    format!("{step:03}_{timestamp}_{name}")
}

/// File name stem for an error capture.
pub fn error_prefix(timestamp: &str, name: &str) -> String {
    format!("ERROR_{timestamp}_{name}")
}

struct PageInfo {
    url: String,
    title: String,
}

fn meta_text(prefix: &str, description: &str, page: &PageInfo) -> String {
    format!(
        "Step: {prefix}\nTimestamp: {}\nDescription: {description}\nURL: {}\nPage Title: {}\n",
        Local::now().to_rfc3339(),
        page.url,
        page.title
    )
}

fn annotate_html(prefix: &str, description: &str, page: &PageInfo, source: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<!-- Debug capture for: {prefix} -->\n<!-- Timestamp: {} -->\n\
         <!-- Description: {description} -->\n<!-- URL: {} -->\n<!-- Page Title: {} -->\n\n{source}\n",
        Local::now().to_rfc3339(),
        page.url,
        page.title
    )
}

/// Writes debug captures for one browser session.
pub struct DebugCapture {
    client: Client,
    root: PathBuf,
    screenshots_dir: PathBuf,
    html_dir: PathBuf,
    steps: AtomicU32,
}

impl DebugCapture {
    pub fn new(client: Client, config: &ScraperConfig) -> Self {
        Self {
            client,
            root: config.debug_path.clone(),
            screenshots_dir: config.debug_screenshots_path(),
            html_dir: config.debug_html_path(),
            steps: AtomicU32::new(0),
        }
    }

    /// Number of step captures taken so far.
    pub fn step_count(&self) -> u32 {
        self.steps.load(Ordering::Relaxed)
    }

    async fn page_info(&self) -> PageInfo {
        let url = self
            .client
            .current_url()
            .await
            .map_or_else(|_| "unknown".to_string(), |u| u.to_string());
        let title = self.client.title().await.unwrap_or_default();
        PageInfo { url, title }
    }

    async fn capture(&self, prefix: &str, description: &str) {
        let page = self.page_info().await;
        if let Err(e) = self.write_screenshot(prefix, description, &page).await {
            tracing::warn!(target: "lyubitori.browser", prefix, error = %e, "Failed to capture screenshot");
        }
        if let Err(e) = self.write_html(prefix, description, &page).await {
            tracing::warn!(target: "lyubitori.browser", prefix, error = %e, "Failed to capture HTML source");
        }
    }

    async fn write_screenshot(
        &self,
        prefix: &str,
        description: &str,
        page: &PageInfo,
    ) -> BrowserResult<()> {
        let png = self.client.screenshot().await?;
        tokio::fs::create_dir_all(&self.screenshots_dir).await?;
        tokio::fs::write(self.screenshots_dir.join(format!("{prefix}.png")), png).await?;
        tokio::fs::write(
            self.screenshots_dir.join(format!("{prefix}_meta.txt")),
            meta_text(prefix, description, page),
        )
        .await?;
        Ok(())
    }

    async fn write_html(&self, prefix: &str, description: &str, page: &PageInfo) -> BrowserResult<()> {
        let source = self.client.source().await?;
        tokio::fs::create_dir_all(&self.html_dir).await?;
        tokio::fs::write(
            self.html_dir.join(format!("{prefix}.html")),
            annotate_html(prefix, description, page, &source),
        )
        .await?;
        Ok(())
    }

    async fn build_summary(&self) -> BrowserResult<String> {
        let mut out = String::from("Lyubitori Debug Session Summary\n");
        out.push_str(&"=".repeat(40));
        out.push('\n');
        out.push_str(&format!("Session summarised: {}\n", Local::now().to_rfc3339()));
        out.push_str(&format!("Total debug steps: {}\n\n", self.step_count()));

        out.push_str("Screenshots captured:\n");
        for name in list_with_extension(&self.screenshots_dir, "png").await? {
            out.push_str(&format!("  - {name}\n"));
        }
        out.push_str("\nHTML sources captured:\n");
        for name in list_with_extension(&self.html_dir, "html").await? {
            out.push_str(&format!("  - {name}\n"));
        }
        out.push_str(&format!("\nDebug files location: {}\n", self.root.display()));
        Ok(out)
    }
}

/// Sorted file names in `dir` with the given extension. Missing dirs are empty.
async fn list_with_extension(dir: &Path, ext: &str) -> BrowserResult<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == ext) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[async_trait]
impl DiagnosticsSink for DebugCapture {
    async fn capture_step(&self, name: &str, description: &str) {
        let step = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        self.capture(&step_prefix(step, &timestamp, name), description).await;
        tracing::debug!(target: "lyubitori.browser", step = name, "Debug capture completed");
    }

    async fn capture_error(&self, name: &str, error: &str) {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        self.capture(&error_prefix(&timestamp, name), &format!("Error occurred: {error}"))
            .await;
        tracing::debug!(target: "lyubitori.browser", step = name, "Debug error capture completed");
    }

    fn log_action(&self, action: &str, details: &str) {
        tracing::info!(target: "lyubitori.browser", "[DEBUG] {action}: {details}");
    }

    async fn write_summary(&self) {
        let path = self.root.join(SUMMARY_FILE_NAME);
        let result = match self.build_summary().await {
            Ok(summary) => tokio::fs::write(&path, summary).await.map_err(Into::into),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                tracing::info!(target: "lyubitori.browser", path = %path.display(), "Debug summary created");
            }
            Err(e) => {
                tracing::warn!(target: "lyubitori.browser", error = %e, "Failed to create debug summary");
            }
        }
    }
}
