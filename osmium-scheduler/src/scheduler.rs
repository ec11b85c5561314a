use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use osmium_common::error::Error;
use osmium_common::state::TaskStore;
use osmium_common::task::{DependStatus, TaskStatus};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::dispatch::Dispatch;
use crate::resolver::DependencyResolver;

/// What one tick did.
#[derive(Debug, Default, Clone)]
pub struct TickSummary {
    /// Runnable tasks considered this tick.
    pub processed: usize,
    /// Tasks handed to the dispatch callback.
    pub dispatched: usize,
    /// Tasks failed because a dependency failed.
    pub failed: usize,
    pub duration: Duration,
}

/// Periodic selector of runnable tasks.
/// ---
/// A tick is single-threaded; all parallelism comes from whatever the
/// dispatch callback does with the task values it is handed.
#[derive(Debug)]
pub struct Scheduler {
    id: Uuid,
    store: Arc<dyn TaskStore>,
    resolver: DependencyResolver,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(store: Arc<dyn TaskStore>, config: SchedulerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            store: Arc::clone(&store),
            resolver: DependencyResolver::new(store),
            config,
        }
    }

    /// Run one tick over the currently runnable tasks.
    /// ---
    /// Tasks whose dependencies are clear are handed to `dispatch`; tasks
    /// with a failed dependency are failed right here without dispatching;
    /// waiting tasks are left for a later tick. Per-task errors are logged
    /// and do not abort the tick.
    pub async fn run_tasks(&self, dispatch: &dyn Dispatch) -> Result<TickSummary, Error> {
        let start = Instant::now();
        let mut summary = TickSummary::default();

        let runnable = self
            .store
            .find_runnable(self.config.max_attempts, Utc::now())
            .await?;

        for mut task in runnable {
            summary.processed += 1;

            let depend_status = match self.resolver.classify(&task).await {
                Ok(status) => status,
                Err(e) => {
                    error!(
                        "Scheduler [{}]: failed to resolve dependencies for task {}: {}",
                        self.id, task, e
                    );
                    continue;
                }
            };

            match depend_status {
                DependStatus::None | DependStatus::Clear => {
                    info!(
                        "Scheduler [{}]: sending task {} to execution.",
                        self.id, task
                    );
                    // The dispatched worker takes ownership of this task
                    // value; nothing is shared with this loop or with
                    // sibling workers.
                    match dispatch.dispatch(task) {
                        Ok(()) => summary.dispatched += 1,
                        Err(e) => {
                            error!("Scheduler [{}]: dispatch failed: {}", self.id, e);
                        }
                    }
                }
                DependStatus::Failed => {
                    task.status = TaskStatus::Failed;
                    task.next_run_at = None;
                    if let Err(e) = self.store.upsert(&task).await {
                        error!(
                            "Scheduler [{}]: failed to persist dependency failure for task {}: {}",
                            self.id, task, e
                        );
                    } else {
                        summary.failed += 1;
                    }
                }
                DependStatus::Wait => {
                    // Reconsidered on a later tick.
                }
            }
        }

        summary.duration = start.elapsed();
        if summary.processed > 0 {
            info!(
                "Scheduler [{}]: processed {} tasks in {:?}.",
                self.id, summary.processed, summary.duration
            );
        } else {
            debug!(
                "Scheduler [{}]: had nothing to do for {:?}.",
                self.id, summary.duration
            );
        }

        Ok(summary)
    }
}
