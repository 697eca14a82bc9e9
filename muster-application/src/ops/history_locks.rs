use std::collections::HashMap;
use std::sync::Arc;

use muster_domain::HistoryKey;
use tokio::sync::{Mutex, OwnedMutexGuard};

const PRUNE_THRESHOLD: usize = 4096;

/// One async mutex per (volunteer, event) history so that verification and
/// append happen atomically per key while other keys proceed.
#[derive(Default)]
pub struct HistoryLocks {
    locks: Mutex<HashMap<HistoryKey, Arc<Mutex<()>>>>,
}

impl HistoryLocks {
    pub async fn acquire(&self, key: &HistoryKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= PRUNE_THRESHOLD {
                // entries nobody holds or waits on only have the map's reference
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muster_domain::{EventId, VolunteerId};
    use std::time::Duration;

    fn key(volunteer: &str) -> HistoryKey {
        HistoryKey::new(VolunteerId(volunteer.to_string()), EventId("event".to_string()))
    }

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(HistoryLocks::default());
        let guard = locks.acquire(&key("a")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&key("a")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender acquires after release")
            .expect("task joins");
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = HistoryLocks::default();
        let _a = locks.acquire(&key("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire(&key("b"))).await;
        assert!(b.is_ok());
        assert_eq!(locks.len().await, 2);
    }
}
