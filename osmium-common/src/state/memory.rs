use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::error::Error;
use crate::registry::TaskRegistry;
use crate::task::{Task, TaskStatus};

use super::TaskStore;

/// In-memory task store, for tests and single-process embeddings.
/// ---
/// Tasks are held as raw JSON documents, exactly like an external document
/// store would hold them, so every read exercises the same two-phase
/// deserialize-then-decode path as the real adapters.
pub struct MemoryTaskStore {
    documents: RwLock<HashMap<Uuid, serde_json::Value>>,
    registry: Arc<TaskRegistry>,
}

impl MemoryTaskStore {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            registry,
        }
    }

    /// Insert a raw document, bypassing the typed write path.
    /// ---
    /// Lets tests and tooling plant records the way a foreign process
    /// would, including records of unregistered types.
    pub async fn insert_raw(&self, id: Uuid, document: serde_json::Value) {
        self.documents.write().await.insert(id, document);
    }

    fn decode_document(&self, document: &serde_json::Value) -> Result<Task, Error> {
        let mut task: Task = serde_json::from_value(document.clone())?;
        self.registry.decode_body(&mut task)?;
        Ok(task)
    }

    /// Deserialize the generic fields of every document, dropping documents
    /// that are not even structurally tasks.
    async fn load_all(&self) -> Vec<Task> {
        let documents = self.documents.read().await;
        let mut tasks = Vec::with_capacity(documents.len());
        for document in documents.values() {
            match serde_json::from_value::<Task>(document.clone()) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!("Memory store: skipping malformed task document: {}", e),
            }
        }
        tasks
    }

    /// Run the body decoder over a selected task, logging and dropping it
    /// when its type is unknown or its body does not decode.
    fn decode_selected(&self, mut task: Task) -> Option<Task> {
        match self.registry.decode_body(&mut task) {
            Ok(()) => Some(task),
            Err(e) => {
                warn!("Memory store: skipping task {}: {}", task, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for MemoryTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTaskStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_runnable(
        &self,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, Error> {
        let mut runnable: Vec<Task> = self
            .load_all()
            .await
            .into_iter()
            .filter(|t| {
                t.status == TaskStatus::Pending
                    && t.attempts < max_attempts
                    && t.next_run_at.is_some_and(|at| at <= now)
            })
            .filter_map(|t| self.decode_selected(t))
            .collect();

        runnable.sort_by_key(|t| (t.next_run_at, t.id));

        Ok(runnable)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Task>, Error> {
        Ok(self
            .load_all()
            .await
            .into_iter()
            .filter(|t| ids.contains(&t.id))
            .filter_map(|t| self.decode_selected(t))
            .collect())
    }

    async fn upsert(&self, task: &Task) -> Result<(), Error> {
        let document = serde_json::to_value(task)?;
        self.documents.write().await.insert(task.id, document);
        Ok(())
    }

    async fn set_status(&self, task_id: Uuid, status: TaskStatus) -> Result<(), Error> {
        let mut documents = self.documents.write().await;
        let document = documents.get_mut(&task_id).ok_or_else(|| Error::NotFound {
            resource_type: "Task".to_string(),
            resource_id: task_id.to_string(),
        })?;

        match document.as_object_mut() {
            Some(fields) => {
                fields.insert("status".to_string(), serde_json::to_value(status)?);
                Ok(())
            }
            None => Err(Error::Internal(format!(
                "task document {} is not an object",
                task_id
            ))),
        }
    }
}
