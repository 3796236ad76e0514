//! In-memory registry of background download tasks.
//!
//! One mutex covers the whole map. It is held only for a single update or
//! snapshot and never across an await point, so a poisoned lock can only
//! mean a panic mid-update; the data is still taken over rather than
//! failing every later call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use indexmap::IndexMap;
use lyubitori_core::{TaskId, TaskProgress, TaskRecord, TaskResults, TaskStatus};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Task {0} not found")]
    NotFound(TaskId),

    #[error("Task {id} already finished with status {status}")]
    AlreadyFinished { id: TaskId, status: TaskStatus },
}

struct TaskEntry {
    record: TaskRecord,
    cancel: CancellationToken,
}

/// Shared handle to the task table. Cloning shares the same table.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<Mutex<IndexMap<TaskId, TaskEntry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<TaskId, TaskEntry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to a task that has not finished yet.
    ///
    /// Finished tasks are left untouched; returns whether `f` ran.
    fn update_active<F>(&self, id: TaskId, f: F) -> bool
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut tasks = self.lock();
        match tasks.get_mut(&id) {
            Some(entry) if !entry.record.is_finished() => {
                f(&mut entry.record);
                true
            }
            _ => false,
        }
    }

    /// Register a pending task and hand back its cancellation token.
    pub fn create(&self, record: TaskRecord) -> CancellationToken {
        let cancel = CancellationToken::new();
        let id = record.task_id;
        self.lock().insert(
            id,
            TaskEntry {
                record,
                cancel: cancel.clone(),
            },
        );
        tracing::debug!(target: "lyubitori.tasks", task_id = %id, "Task registered");
        cancel
    }

    pub fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.lock().get(&id).map(|entry| entry.record.clone())
    }

    /// Snapshot of every task in creation order.
    pub fn list(&self) -> Vec<TaskRecord> {
        self.lock().values().map(|entry| entry.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Tasks that are pending or running.
    pub fn active_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| !entry.record.is_finished())
            .count()
    }

    pub fn mark_running(&self, id: TaskId) -> bool {
        self.update_active(id, |record| {
            record.status = TaskStatus::Running;
            record.started_at = Some(Utc::now());
        })
    }

    pub fn update_progress(&self, id: TaskId, progress: TaskProgress) -> bool {
        self.update_active(id, |record| record.progress = progress)
    }

    /// Move a task to a terminal status. A task that already finished keeps
    /// its first terminal status.
    pub fn finish(
        &self,
        id: TaskId,
        status: TaskStatus,
        results: Option<TaskResults>,
        error_message: Option<String>,
    ) -> bool {
        debug_assert!(status.is_finished());
        let finished = self.update_active(id, |record| {
            record.status = status;
            record.completed_at = Some(Utc::now());
            record.results = results;
            record.error_message = error_message;
        });
        if finished {
            tracing::info!(target: "lyubitori.tasks", task_id = %id, %status, "Task finished");
        }
        finished
    }

    pub fn complete(&self, id: TaskId, results: TaskResults) -> bool {
        self.finish(id, TaskStatus::Completed, Some(results), None)
    }

    pub fn fail(&self, id: TaskId, error_message: impl Into<String>) -> bool {
        self.finish(id, TaskStatus::Failed, None, Some(error_message.into()))
    }

    /// Signal a task to stop at its next round boundary.
    ///
    /// The status changes once the run observes the signal.
    pub fn cancel(&self, id: TaskId) -> Result<(), RegistryError> {
        let tasks = self.lock();
        let entry = tasks.get(&id).ok_or(RegistryError::NotFound(id))?;
        if entry.record.is_finished() {
            return Err(RegistryError::AlreadyFinished {
                id,
                status: entry.record.status,
            });
        }
        entry.cancel.cancel();
        tracing::info!(target: "lyubitori.tasks", task_id = %id, "Cancellation requested");
        Ok(())
    }
}
