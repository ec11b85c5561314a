use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{TaskBody, TaskStatus};

/// A durable, retryable unit of work.
/// ---
/// Tasks are created `Pending` with `next_run_at` set to now, so the first
/// attempt happens on the next scheduler tick. `attempts` counts completed
/// attempts and always matches the length of `log`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub client_id: Uuid,
    pub request_id: Option<Uuid>,
    /// Tasks that must complete before this one may run.
    pub depends: Vec<Uuid>,
    /// Advisory locks held for the duration of each attempt.
    pub locks: Vec<Uuid>,
    pub task_type: String,
    pub body: TaskBody,
    pub created_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub attempts: i32,
    pub last_run_at: Option<DateTime<Utc>>,
    /// Earliest wall-clock time for the next attempt. `None` once terminal.
    pub next_run_at: Option<DateTime<Utc>>,
    pub log: Vec<TaskHistoryRecord>,
}

impl Task {
    pub fn new(client_id: Uuid, task_type: impl Into<String>, body: TaskBody) -> Self {
        let now = Utc::now();
        let task = Self {
            id: Uuid::new_v4(),
            client_id,
            request_id: None,
            depends: Vec::new(),
            locks: Vec::new(),
            task_type: task_type.into(),
            body,
            created_at: now,
            status: TaskStatus::Pending,
            attempts: 0,
            last_run_at: None,
            next_run_at: Some(now),
            log: Vec::new(),
        };
        debug!("Created new task: {}", task);
        task
    }

    /// Create a task this one depends on, inheriting the client.
    /// ---
    /// The child's id is appended to `depends`; the child is returned
    /// unpersisted, so the caller must store both tasks.
    pub fn new_dependent(&mut self, task_type: impl Into<String>, body: TaskBody) -> Task {
        let child = Task::new(self.client_id, task_type, body);
        self.depends.push(child.id);
        child
    }

    pub fn set_request_id(&mut self, request_id: Uuid) -> &mut Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn add_lock(&mut self, lock_id: Uuid) -> &mut Self {
        self.locks.push(lock_id);
        self
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id.simple(), self.task_type)
    }
}

/// One completed attempt, as recorded in the task's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskHistoryRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl TaskHistoryRecord {
    pub fn running_time(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> TaskBody {
        TaskBody::from_raw(json!({"key": "value"}))
    }

    #[test]
    fn new_task_is_scheduled_immediately() {
        let client = Uuid::new_v4();
        let task = Task::new(client, "noop", body());

        assert_eq!(task.client_id, client);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.next_run_at, Some(task.created_at));
        assert!(task.depends.is_empty());
        assert!(task.locks.is_empty());
        assert!(task.log.is_empty());
        assert!(task.last_run_at.is_none());
        assert!(task.request_id.is_none());
    }

    #[test]
    fn dependent_task_inherits_client_and_links_back() {
        let mut parent = Task::new(Uuid::new_v4(), "parent", body());
        let child = parent.new_dependent("child", body());

        assert_eq!(child.client_id, parent.client_id);
        assert_eq!(parent.depends, vec![child.id]);
        assert!(child.depends.is_empty());
    }

    #[test]
    fn add_lock_appends_in_order() {
        let mut task = Task::new(Uuid::new_v4(), "noop", body());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        task.add_lock(first).add_lock(second);

        assert_eq!(task.locks, vec![first, second]);
    }

    #[test]
    fn display_uses_simple_hex_id_and_type() {
        let task = Task::new(Uuid::new_v4(), "sync_profiles", body());
        let rendered = task.to_string();

        assert_eq!(
            rendered,
            format!("{} (sync_profiles)", task.id.simple())
        );
        assert!(!rendered.contains('-'));
    }

    #[test]
    fn history_record_running_time() {
        let started_at = Utc::now();
        let record = TaskHistoryRecord {
            started_at,
            finished_at: started_at + chrono::Duration::seconds(7),
            error: None,
        };

        assert_eq!(record.running_time(), chrono::Duration::seconds(7));
    }
}
