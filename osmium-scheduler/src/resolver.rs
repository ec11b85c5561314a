use std::sync::Arc;

use osmium_common::error::Error;
use osmium_common::state::TaskStore;
use osmium_common::task::{DependStatus, Task, TaskStatus};
use tracing::{debug, warn};

/// Classifies the dependency set of a task without writing anything.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    store: Arc<dyn TaskStore>,
}

impl DependencyResolver {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Decide whether `task` may run right now.
    /// ---
    /// Completed dependencies contribute nothing; a single failed or
    /// cancelled dependency condemns the task. Dependency ids that cannot
    /// be found in the store count as still waiting, so a task never runs
    /// on the strength of a record that merely went missing.
    pub async fn classify(&self, task: &Task) -> Result<DependStatus, Error> {
        if task.depends.is_empty() {
            debug!("Task {} has no dependencies.", task);
            return Ok(DependStatus::None);
        }

        let dependencies = self.store.find_by_ids(&task.depends).await?;

        let mut waiting: Vec<&Task> = Vec::new();
        let mut fatal: Vec<&Task> = Vec::new();

        for dependency in &dependencies {
            match dependency.status {
                TaskStatus::Pending | TaskStatus::Paused | TaskStatus::Running => {
                    waiting.push(dependency)
                }
                TaskStatus::Failed | TaskStatus::Cancelled => fatal.push(dependency),
                TaskStatus::Complete => {}
            }
        }

        let missing = task.depends.len().saturating_sub(dependencies.len());

        if !fatal.is_empty() {
            warn!(
                "Task {} cannot be executed because of failed dependencies: {}",
                task,
                render_tasks(&fatal)
            );
            return Ok(DependStatus::Failed);
        }

        if !waiting.is_empty() || missing > 0 {
            debug!(
                "Task {} is still waiting for {} dependencies.",
                task,
                waiting.len() + missing
            );
            return Ok(DependStatus::Wait);
        }

        debug!("All dependencies for task {} are clear.", task);
        Ok(DependStatus::Clear)
    }
}

fn render_tasks(tasks: &[&Task]) -> String {
    tasks
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
