use std::{env, sync::Arc};

use osmium_common::lock::LockService;
use osmium_common::registry::TaskRegistry;
use osmium_common::state::TaskStore;
use osmium_persistence_pg::{PgLockService, PgStateDb};
use osmium_scheduler::config::SchedulerConfig;
use osmium_scheduler::dispatch::WorkerDispatch;
use osmium_scheduler::registrator::register_tasks;
use osmium_scheduler::scheduler::Scheduler;
use osmium_scheduler::worker::TaskWorker;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let config = SchedulerConfig::from_env().expect("Invalid scheduler configuration");

    // Task types, handlers, decoders and registrators are wired up here by
    // the embedding application before the loop starts.
    let registry = Arc::new(TaskRegistry::builder().build());

    let store = PgStateDb::new(&database_url, Arc::clone(&registry))
        .await
        .expect("Failed to connect to database");
    let store: Arc<dyn TaskStore> = Arc::new(store);

    let lock_service = PgLockService::new(&database_url)
        .await
        .expect("Failed to connect lock service");
    let lock_service: Arc<dyn LockService> = Arc::new(lock_service);

    let worker = Arc::new(TaskWorker::new(
        Arc::clone(&store),
        lock_service,
        Arc::clone(&registry),
        &config,
    ));
    let dispatch = WorkerDispatch::new(worker);
    let scheduler = Scheduler::new(Arc::clone(&store), config.clone());

    info!("Scheduler started.");

    let mut tick = tokio::time::interval(config.tick_interval);
    let mut registration = tokio::time::interval(config.registration_interval);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = scheduler.run_tasks(&dispatch).await {
                    error!("Scheduler tick failed: {}", e);
                }
            }
            _ = registration.tick() => {
                register_tasks(&registry).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping scheduler.");
                break;
            }
        }
    }
}
