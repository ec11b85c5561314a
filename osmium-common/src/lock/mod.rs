use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Error;
use crate::task::Task;

mod memory;
pub use memory::MemoryLockService;

/// How long each individual lock acquisition may wait before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(3);

/// Named advisory locks provided by an external service.
#[async_trait]
pub trait LockService: Send + Sync + Debug + 'static {
    /// Try to take `name`, waiting at most `timeout`. `true` means the
    /// caller now holds the lock.
    async fn acquire(&self, name: &str, timeout: Duration) -> Result<bool, Error>;

    async fn release(&self, name: &str) -> Result<(), Error>;
}

/// Acquires and releases the full lock set of a task.
/// ---
/// Lock names are the plain hex renderings of the lock ids carried on the
/// task, so unrelated tasks contend on equal ids regardless of which
/// scheduler instance runs them.
#[derive(Debug, Clone)]
pub struct LockClient {
    service: Arc<dyn LockService>,
    timeout: Duration,
}

impl LockClient {
    pub fn new(service: Arc<dyn LockService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// Acquire every lock of `task` in list order.
    /// ---
    /// All-or-nothing: when any acquisition fails, every lock obtained so
    /// far is released again (best-effort, release errors are logged) and
    /// the error names the lock that blocked.
    pub async fn acquire_all(&self, task: &Task) -> Result<(), Error> {
        let mut obtained: Vec<String> = Vec::with_capacity(task.locks.len());

        for lock_id in &task.locks {
            let name = lock_id.simple().to_string();
            let held = match self.service.acquire(&name, self.timeout).await {
                Ok(held) => held,
                Err(e) => {
                    warn!("Lock service failed while acquiring {}: {}", name, e);
                    false
                }
            };

            if !held {
                for release in &obtained {
                    if let Err(e) = self.service.release(release).await {
                        warn!(
                            "Failed to roll back lock {} for task {}: {}",
                            release, task, e
                        );
                    }
                }
                return Err(Error::Lock(format!("failed to obtain lock {}", name)));
            }

            info!("Obtained lock {} for task {}.", name, task);
            obtained.push(name);
        }

        Ok(())
    }

    /// Release every lock of `task`, even when some releases fail.
    /// ---
    /// All failures are accumulated and returned together.
    pub async fn release_all(&self, task: &Task) -> Result<(), Error> {
        let mut failures: Vec<String> = Vec::new();

        for lock_id in &task.locks {
            let name = lock_id.simple().to_string();
            match self.service.release(&name).await {
                Ok(()) => info!("Released lock {} for task {}.", name, task),
                Err(e) => failures.push(format!("failed to release lock {}: {}", name, e)),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::LockRelease(failures))
        }
    }
}
