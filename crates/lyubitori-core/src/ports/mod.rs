//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define what the engine and services expect from the browser
//! adapter. They use only domain types; no WebDriver types appear in any
//! signature.

pub mod auth_gate;
pub mod diagnostics;
pub mod feed_page;
pub mod fetch_bridge;
pub mod progress;
pub mod session;

pub use auth_gate::AuthGate;
pub use diagnostics::{DiagnosticsSink, NoopDiagnostics};
pub use feed_page::FeedPage;
pub use fetch_bridge::FetchBridge;
pub use progress::{NoopProgress, ProgressSink};
pub use session::{ScrapeSession, SessionConnector};
