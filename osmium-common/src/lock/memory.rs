use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::Error;

use super::LockService;

const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Process-local lock service, for tests and single-process embeddings.
#[derive(Debug, Default)]
pub struct MemoryLockService {
    held: Mutex<HashSet<String>>,
}

impl MemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_held(&self, name: &str) -> bool {
        self.held.lock().await.contains(name)
    }
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn acquire(&self, name: &str, timeout: Duration) -> Result<bool, Error> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.held.lock().await.insert(name.to_string()) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(ACQUIRE_POLL_INTERVAL).await;
        }
    }

    async fn release(&self, name: &str) -> Result<(), Error> {
        if self.held.lock().await.remove(name) {
            Ok(())
        } else {
            Err(Error::Lock(format!("lock {name} is not held")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_is_exclusive_until_released() {
        let service = MemoryLockService::new();

        assert!(service.acquire("a", Duration::from_millis(1)).await.unwrap());
        assert!(!service.acquire("a", Duration::from_millis(1)).await.unwrap());

        service.release("a").await.unwrap();
        assert!(service.acquire("a", Duration::from_millis(1)).await.unwrap());
    }

    #[tokio::test]
    async fn acquire_waits_until_the_holder_releases() {
        let service = std::sync::Arc::new(MemoryLockService::new());
        assert!(service.acquire("a", Duration::from_millis(1)).await.unwrap());

        let waiter = std::sync::Arc::clone(&service);
        let join = tokio::spawn(async move { waiter.acquire("a", Duration::from_secs(1)).await });

        tokio::time::sleep(Duration::from_millis(30)).await;
        service.release("a").await.unwrap();

        assert!(join.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn releasing_an_unheld_lock_fails() {
        let service = MemoryLockService::new();

        assert!(service.release("nope").await.is_err());
    }
}
