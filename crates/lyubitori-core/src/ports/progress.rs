//! Progress reporting port.

use crate::task::TaskProgress;

/// Receives progress after every completed round.
///
/// Called from inside the engine loop; implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: TaskProgress);
}

/// A progress sink that discards updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _progress: TaskProgress) {}
}
