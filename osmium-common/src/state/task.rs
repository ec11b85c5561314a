use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::Error,
    task::{Task, TaskStatus},
};

/// Durable task storage.
/// ---
/// Implementations decode task bodies through the codec registry on every
/// read; records whose type has no registered decoder are logged and
/// skipped rather than aborting the whole read.
#[async_trait]
pub trait TaskStore: Send + Sync + Debug + 'static {
    /// Tasks that are due to run: `Pending`, below the attempt cap and with
    /// `next_run_at` in the past, ordered by `(next_run_at, id)` ascending.
    /// ---
    /// The sort gives a deterministic tie-break and approximate FIFO
    /// fairness across ticks.
    async fn find_runnable(
        &self,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, Error>;

    /// Membership lookup by id set; ordering is unspecified.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Task>, Error>;

    /// Write the full task record, inserting or replacing by id.
    async fn upsert(&self, task: &Task) -> Result<(), Error>;

    /// Partial update of the status field only.
    /// ---
    /// Used for the `Pending` to `Running` flip before an attempt starts,
    /// so concurrent schedulers observe the transition as early as possible.
    async fn set_status(&self, task_id: Uuid, status: TaskStatus) -> Result<(), Error>;
}
