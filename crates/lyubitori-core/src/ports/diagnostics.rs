//! Debug capture port.
//!
//! Diagnostics are orthogonal to the engine: every method is infallible
//! from the caller's perspective. Implementations log their own failures
//! and never propagate them.

use async_trait::async_trait;

#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    /// Record the current page state under a step name.
    async fn capture_step(&self, name: &str, description: &str);

    /// Record the current page state alongside an error.
    async fn capture_error(&self, name: &str, error: &str);

    /// Append a line to the action log.
    fn log_action(&self, action: &str, details: &str);

    /// Write an index of everything captured so far.
    async fn write_summary(&self);
}

/// A sink that records nothing. Used when debug mode is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl NoopDiagnostics {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DiagnosticsSink for NoopDiagnostics {
    async fn capture_step(&self, _name: &str, _description: &str) {}

    async fn capture_error(&self, _name: &str, _error: &str) {}

    fn log_action(&self, _action: &str, _details: &str) {}

    async fn write_summary(&self) {}
}
