use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes writes per entity so they complete in the order they were
/// issued. Without this, two rapid edits against the same row can resolve
/// out of order and the earlier request's payload wins.
///
/// The tokio mutex hands the lock out FIFO, which is the property we rely
/// on: whoever called `acquire` first writes first. Different keys never
/// contend.
pub struct WriteSequencer<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> WriteSequencer<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Take the write slot for `key`, waiting behind earlier callers.
    /// The guard releases the slot on drop.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("sequencer map poisoned");
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }
}

impl<K: Eq + Hash + Clone> Default for WriteSequencer<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn writes_to_same_key_apply_in_issue_order() {
        let sequencer = Arc::new(WriteSequencer::new());
        let value = Arc::new(Mutex::new(0));

        // First writer grabs the slot, then stalls; the second writer must
        // still land after it.
        let first = {
            let sequencer = Arc::clone(&sequencer);
            let value = Arc::clone(&value);
            let guard = sequencer.acquire(1).await;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                *value.lock().unwrap() = 1;
                drop(guard);
            })
        };
        let second = {
            let sequencer = Arc::clone(&sequencer);
            let value = Arc::clone(&value);
            tokio::spawn(async move {
                let _guard = sequencer.acquire(1).await;
                *value.lock().unwrap() = 2;
            })
        };

        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(*value.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let sequencer = WriteSequencer::new();
        let _held = sequencer.acquire("a").await;

        // Must not deadlock.
        let _other = sequencer.acquire("b").await;
    }
}
