use std::time::Instant;

use osmium_common::registry::TaskRegistry;
use tracing::{debug, info};

/// Run every registered registrator once and report how many tasks the
/// sweep produced.
/// ---
/// Registrators persist whatever tasks they create themselves; this driver
/// only accounts for them.
pub async fn register_tasks(registry: &TaskRegistry) -> usize {
    let start = Instant::now();
    let mut total = 0;

    debug!("Task registration started.");

    for (task_type, registrator) in registry.registrators() {
        let count = registrator.register().await;
        if count > 0 {
            info!("Registered {} new '{}' (or related) tasks.", count, task_type);
        }
        total += count;
    }

    let elapsed = start.elapsed();
    if total > 0 {
        info!("Task registration produced {} tasks in {:?}.", total, elapsed);
    } else {
        debug!("Task registration had nothing to do for {:?}.", elapsed);
    }

    total
}
