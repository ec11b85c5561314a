use std::sync::Arc;

use osmium_common::error::Error;
use osmium_common::task::Task;

use crate::worker::TaskWorker;

/// Hands a runnable task over for execution.
/// ---
/// Each call transfers ownership of the task value, so implementations are
/// free to run tasks on parallel workers without sharing anything with the
/// scheduler or with sibling workers.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, task: Task) -> Result<(), Error>;
}

/// Dispatch that runs each task on its own tokio task.
#[derive(Debug, Clone)]
pub struct WorkerDispatch {
    worker: Arc<TaskWorker>,
}

impl WorkerDispatch {
    pub fn new(worker: Arc<TaskWorker>) -> Self {
        Self { worker }
    }
}

impl Dispatch for WorkerDispatch {
    fn dispatch(&self, task: Task) -> Result<(), Error> {
        let worker = Arc::clone(&self.worker);
        tokio::spawn(async move {
            worker.run(task).await;
        });
        Ok(())
    }
}
