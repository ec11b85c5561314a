//! End-to-end lifecycle tests: scheduler tick, async dispatch, worker
//! execution and persistence, all against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use osmium_common::error::HandlerError;
use osmium_common::lock::{LockService, MemoryLockService};
use osmium_common::registry::TaskRegistry;
use osmium_common::state::{MemoryTaskStore, TaskStore};
use osmium_common::task::{Task, TaskBody, TaskHandler, TaskStatus};
use osmium_scheduler::config::SchedulerConfig;
use osmium_scheduler::dispatch::WorkerDispatch;
use osmium_scheduler::scheduler::Scheduler;
use osmium_scheduler::worker::TaskWorker;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ReportPayload {
    report_name: String,
    page_count: u32,
}

struct NoopHandler;

#[async_trait]
impl TaskHandler for NoopHandler {
    async fn handle(&self, _task: &Task) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Succeeds only when the payload decoded into the expected type.
struct PayloadCheckingHandler;

#[async_trait]
impl TaskHandler for PayloadCheckingHandler {
    async fn handle(&self, task: &Task) -> Result<(), HandlerError> {
        match task.body.payload::<ReportPayload>() {
            Some(_) => Ok(()),
            None => Err(HandlerError::fatal("payload was not decoded")),
        }
    }
}

struct Harness {
    store: Arc<MemoryTaskStore>,
    scheduler: Scheduler,
    dispatch: WorkerDispatch,
}

fn harness(registry: TaskRegistry) -> Harness {
    let registry = Arc::new(registry);
    let store = Arc::new(MemoryTaskStore::new(Arc::clone(&registry)));
    let lock_service: Arc<dyn LockService> = Arc::new(MemoryLockService::new());

    let config = SchedulerConfig {
        max_attempts: 3,
        lock_timeout: Duration::from_millis(50),
        ..SchedulerConfig::default()
    };

    let worker = Arc::new(TaskWorker::new(
        store.clone() as Arc<dyn TaskStore>,
        lock_service,
        registry,
        &config,
    ));

    Harness {
        scheduler: Scheduler::new(store.clone() as Arc<dyn TaskStore>, config),
        dispatch: WorkerDispatch::new(worker),
        store,
    }
}

async fn reload(store: &MemoryTaskStore, id: Uuid) -> Task {
    store
        .find_by_ids(&[id])
        .await
        .unwrap()
        .into_iter()
        .next()
        .expect("task should still exist")
}

/// Poll until the task reaches `status` or the budget runs out.
async fn wait_for_status(store: &MemoryTaskStore, id: Uuid, status: TaskStatus) -> Task {
    for _ in 0..100 {
        let task = reload(store, id).await;
        if task.status == status {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {id} did not reach {status} in time");
}

#[tokio::test]
async fn a_fresh_task_completes_on_the_first_tick() {
    let h = harness(
        TaskRegistry::builder()
            .payload_type::<ReportPayload>("report")
            .handler("report", Arc::new(NoopHandler))
            .build(),
    );

    let task = Task::new(
        Uuid::new_v4(),
        "report",
        TaskBody::new(ReportPayload {
            report_name: "weekly".into(),
            page_count: 12,
        })
        .unwrap(),
    );
    h.store.upsert(&task).await.unwrap();

    let summary = h.scheduler.run_tasks(&h.dispatch).await.unwrap();
    assert_eq!(summary.dispatched, 1);

    let done = wait_for_status(&h.store, task.id, TaskStatus::Complete).await;
    assert_eq!(done.attempts, 1);
    assert_eq!(done.next_run_at, None);
    assert_eq!(done.log.len(), 1);
    assert_eq!(done.log[0].error, None);
}

#[tokio::test]
async fn the_store_decodes_payloads_for_the_handler() {
    let h = harness(
        TaskRegistry::builder()
            .payload_type::<ReportPayload>("report")
            .handler("report", Arc::new(PayloadCheckingHandler))
            .build(),
    );

    let original = Task::new(
        Uuid::new_v4(),
        "report",
        TaskBody::new(ReportPayload {
            report_name: "quarterly".into(),
            page_count: 80,
        })
        .unwrap(),
    );
    h.store.upsert(&original).await.unwrap();

    // Round-trip through storage preserves every field, body included.
    let loaded = reload(&h.store, original.id).await;
    assert_eq!(loaded, original);
    assert_eq!(
        loaded.body.payload::<ReportPayload>().unwrap().report_name,
        "quarterly"
    );

    h.scheduler.run_tasks(&h.dispatch).await.unwrap();
    wait_for_status(&h.store, original.id, TaskStatus::Complete).await;
}

#[tokio::test]
async fn a_dependent_task_runs_after_its_parent_completes() {
    let h = harness(
        TaskRegistry::builder()
            .payload_type::<ReportPayload>("report")
            .handler("report", Arc::new(NoopHandler))
            .build(),
    );

    let body = || TaskBody::from_raw(json!({"report_name": "chained", "page_count": 1}));
    let mut dependent = Task::new(Uuid::new_v4(), "report", body());
    let parent = dependent.new_dependent("report", body());
    h.store.upsert(&parent).await.unwrap();
    h.store.upsert(&dependent).await.unwrap();

    // First tick: only the parent may run.
    let summary = h.scheduler.run_tasks(&h.dispatch).await.unwrap();
    assert_eq!(summary.dispatched, 1);
    wait_for_status(&h.store, parent.id, TaskStatus::Complete).await;

    let still_pending = reload(&h.store, dependent.id).await;
    assert_eq!(still_pending.status, TaskStatus::Pending);
    assert_eq!(still_pending.attempts, 0);

    // Second tick: the dependency is complete, the dependent runs.
    let summary = h.scheduler.run_tasks(&h.dispatch).await.unwrap();
    assert_eq!(summary.dispatched, 1);
    wait_for_status(&h.store, dependent.id, TaskStatus::Complete).await;
}

#[tokio::test]
async fn a_failed_dependency_fails_the_dependent_without_running_it() {
    let h = harness(
        TaskRegistry::builder()
            .payload_type::<ReportPayload>("report")
            .handler(
                "report",
                Arc::new(PayloadCheckingHandler), // would fail loudly if invoked
            )
            .build(),
    );

    let body = || TaskBody::from_raw(json!({"report_name": "doomed", "page_count": 1}));
    let mut dependent = Task::new(Uuid::new_v4(), "report", body());
    let mut parent = dependent.new_dependent("report", body());
    parent.status = TaskStatus::Failed;
    parent.next_run_at = None;
    h.store.upsert(&parent).await.unwrap();
    h.store.upsert(&dependent).await.unwrap();

    let summary = h.scheduler.run_tasks(&h.dispatch).await.unwrap();

    assert_eq!(summary.dispatched, 0);
    assert_eq!(summary.failed, 1);

    let failed = reload(&h.store, dependent.id).await;
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.attempts, 0);
    assert!(failed.log.is_empty());
}

#[tokio::test]
async fn a_retried_task_is_not_selected_before_its_backoff_elapses() {
    struct AlwaysFailing;

    #[async_trait]
    impl TaskHandler for AlwaysFailing {
        async fn handle(&self, _task: &Task) -> Result<(), HandlerError> {
            Err(HandlerError::transient("try again later"))
        }
    }

    let h = harness(
        TaskRegistry::builder()
            .payload_type::<ReportPayload>("report")
            .handler("report", Arc::new(AlwaysFailing))
            .build(),
    );

    let task = Task::new(
        Uuid::new_v4(),
        "report",
        TaskBody::from_raw(json!({"report_name": "flaky", "page_count": 1})),
    );
    h.store.upsert(&task).await.unwrap();

    let summary = h.scheduler.run_tasks(&h.dispatch).await.unwrap();
    assert_eq!(summary.dispatched, 1);

    // Wait until the attempt has been recorded; the task passes through
    // Running and lands back in Pending with a future next_run_at.
    let mut retried = reload(&h.store, task.id).await;
    for _ in 0..100 {
        if retried.attempts == 1 && retried.status == TaskStatus::Pending {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        retried = reload(&h.store, task.id).await;
    }
    assert_eq!(retried.status, TaskStatus::Pending);
    assert_eq!(retried.attempts, 1);
    assert!(retried.next_run_at.unwrap() > chrono::Utc::now());

    // The next tick must leave it alone: its backoff has not elapsed.
    let summary = h.scheduler.run_tasks(&h.dispatch).await.unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.dispatched, 0);
}
