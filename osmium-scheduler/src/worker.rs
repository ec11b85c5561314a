use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use osmium_common::error::HandlerError;
use osmium_common::lock::{LockClient, LockService};
use osmium_common::registry::TaskRegistry;
use osmium_common::state::TaskStore;
use osmium_common::task::{Task, TaskHistoryRecord, TaskStatus};
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;

/// When the next attempt of a transiently failed task may run.
/// ---
/// Exponential in the number of completed attempts, anchored on the start
/// time of the failed attempt so the cadence stays stable under slow
/// handlers: 4 minutes after the first attempt, 8 after the second, 16
/// after the third, and so on.
pub fn next_run_time(last_run: DateTime<Utc>, attempts: i32) -> DateTime<Utc> {
    last_run + Duration::minutes(1i64 << (attempts + 1))
}

/// Executes one attempt of one task.
/// ---
/// The worker owns the task value it is given and persists every outcome
/// itself; it never reports errors to its caller.
#[derive(Debug)]
pub struct TaskWorker {
    store: Arc<dyn TaskStore>,
    locks: LockClient,
    registry: Arc<TaskRegistry>,
    max_attempts: i32,
}

impl TaskWorker {
    pub fn new(
        store: Arc<dyn TaskStore>,
        lock_service: Arc<dyn LockService>,
        registry: Arc<TaskRegistry>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            store,
            locks: LockClient::new(lock_service, config.lock_timeout),
            registry,
            max_attempts: config.max_attempts,
        }
    }

    /// Run one attempt: lock, flip to `Running`, invoke the handler, record
    /// the attempt, persist the outcome and release the locks.
    pub async fn run(&self, mut task: Task) {
        // Concurrent schedulers may have raced us to this task; the status
        // flip below is only best-effort, so re-check before doing anything.
        if task.status != TaskStatus::Pending {
            warn!(
                "Failed to run task {}: invalid state ({}).",
                task, task.status
            );
            return;
        }

        if let Err(e) = self.locks.acquire_all(&task).await {
            warn!(
                "Failed to obtain required locks for task {}: {}",
                task, e
            );
            return;
        }

        info!("Worker starting task {}.", task);

        // Make the transition visible to other schedulers before the
        // handler gets to do anything slow.
        if let Err(e) = self.store.set_status(task.id, TaskStatus::Running).await {
            error!("Failed to mark task {} as running: {}", task, e);
            self.release_locks(&task).await;
            return;
        }

        let started_at = Utc::now();
        task.last_run_at = Some(started_at);

        let result = match self.registry.handler(&task.task_type) {
            Some(handler) => handler.handle(&task).await,
            None => Err(HandlerError::fatal(format!(
                "Failed to run task {}: unknown task type.",
                task
            ))),
        };

        let entry = TaskHistoryRecord {
            started_at,
            finished_at: Utc::now(),
            error: result.as_ref().err().map(|e| e.message.clone()),
        };
        task.attempts += 1;
        task.log.push(entry.clone());

        match result {
            Ok(()) => {
                info!("Task {} complete after {} attempt(s).", task, task.attempts);
                task.status = TaskStatus::Complete;
                task.next_run_at = None;
            }
            Err(handler_error) => {
                warn!(
                    "Task {}, attempt {} failed: {}",
                    task, task.attempts, handler_error
                );

                if handler_error.fatal || task.attempts >= self.max_attempts {
                    if handler_error.fatal {
                        warn!("This error is permanent, task cannot be completed.");
                    } else {
                        warn!("Maximum number of attempts reached, task cannot be completed.");
                    }
                    task.status = TaskStatus::Failed;
                    task.next_run_at = None;

                    if let Some(fatal_handler) = self.registry.fatal_handler(&task.task_type) {
                        if let Err(post_mortem) =
                            fatal_handler.on_fatal(&task, &handler_error).await
                        {
                            warn!(
                                "Fatal handler for task {} reported an error: {}",
                                task, post_mortem
                            );
                        }
                    }
                } else {
                    let retry_at = next_run_time(started_at, task.attempts);
                    info!(
                        "This error is temporary, will retry task {} after {}.",
                        task, retry_at
                    );
                    task.status = TaskStatus::Pending;
                    task.next_run_at = Some(retry_at);
                }
            }
        }

        if let Err(e) = self.store.upsert(&task).await {
            error!("Failed to persist task {}: {}", task, e);
        }

        self.release_locks(&task).await;

        info!(
            "Worker processed task {} in {}.",
            task,
            entry.running_time()
        );
    }

    async fn release_locks(&self, task: &Task) {
        // TODO: unreleased locks block every task sharing the lock id until
        // the lock service expires them; surface this through alerting once
        // an operations channel exists.
        if let Err(e) = self.locks.release_all(task).await {
            error!("Failed to release obtained locks for task {}: {}", task, e);
        }
    }
}
