#![doc = include_str!("../README.md")]

pub mod config;
pub mod errors;
pub mod feed;
pub mod lease;
pub mod ports;
pub mod retry;
pub mod round;
pub mod session;
pub mod task;

// Re-export commonly used types for convenience
pub use config::{ConfigError, FRONT_PAGE, ScraperConfig};
pub use errors::{FetchFailed, ScrapeError, ScrapeResult};
pub use feed::{FeedItem, derive_identity, enhance_url, image_id, is_thumbnail, post_context};
pub use lease::{BrowserPolicy, SessionGuard, SessionLock};
pub use ports::{
    AuthGate, DiagnosticsSink, FeedPage, FetchBridge, NoopDiagnostics, NoopProgress,
    ProgressSink, ScrapeSession, SessionConnector,
};
pub use retry::{RetryError, RetryPolicy};
pub use round::{DownloadState, RoundResult};
pub use session::{SessionStore, SessionStoreError, StoredCookie};
pub use task::{TaskId, TaskProgress, TaskRecord, TaskResults, TaskStatus};
