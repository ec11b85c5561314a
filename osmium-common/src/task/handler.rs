use async_trait::async_trait;

use crate::error::{Error, HandlerError};

use super::Task;

/// Performs the actual work for one type of task.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Run one attempt. A `HandlerError` with `fatal` set stops retries.
    async fn handle(&self, task: &Task) -> Result<(), HandlerError>;
}

/// Invoked once after a task of the matching type transitions to `Failed`.
/// ---
/// The return value is logged only; it never changes the task's state.
#[async_trait]
pub trait FatalTaskHandler: Send + Sync {
    async fn on_fatal(&self, task: &Task, error: &HandlerError) -> Result<(), Error>;
}

/// Synthesises and persists new tasks on demand, e.g. periodic jobs.
/// ---
/// Failures are the registrator's own concern; the driver only logs the
/// number of tasks produced.
#[async_trait]
pub trait TaskRegistrator: Send + Sync {
    async fn register(&self) -> usize;
}
