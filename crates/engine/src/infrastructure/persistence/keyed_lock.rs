//! Per-key async mutual exclusion.
//!
//! Same-key critical sections never interleave and run in the order their
//! callers queued (tokio's mutex is fair). Different keys never wait on each
//! other. Entries are dropped from the map once no caller holds or awaits
//! them.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct KeyedLock {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `critical_section` while holding the lock for `key`.
    ///
    /// The lock is released when the section finishes, whether it returns
    /// an error or its future is dropped.
    pub async fn run_with_lock<T, F, Fut>(&self, key: &str, critical_section: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let entry = EntryHandle::acquire(&self.locks, key);
        let _guard = entry.lock.lock().await;
        critical_section().await
    }

    /// Keys with a holder or a waiter.
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}

/// Shared handle on one key's mutex; prunes the map entry on drop when it
/// was the last user.
struct EntryHandle<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    lock: Arc<Mutex<()>>,
}

impl<'a> EntryHandle<'a> {
    fn acquire(locks: &'a DashMap<String, Arc<Mutex<()>>>, key: &str) -> Self {
        let lock = locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self {
            locks,
            key: key.to_string(),
            lock,
        }
    }
}

impl Drop for EntryHandle<'_> {
    fn drop(&mut self) {
        // Map + this handle = 2; anyone else still queued keeps the entry
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn same_key_sections_do_not_interleave() {
        let lock = Arc::new(KeyedLock::new());
        let log = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for name in ["a", "b", "c"] {
            let lock = lock.clone();
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                lock.run_with_lock("story-1", || async {
                    log.lock().unwrap().push(format!("{}:start", name));
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    log.lock().unwrap().push(format!("{}:end", name));
                })
                .await;
            }));
            // Let each task queue before spawning the next
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec!["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_run_concurrently() {
        let lock = Arc::new(KeyedLock::new());
        let log = Arc::new(StdMutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (key, hold_ms) in [("story-1", 20), ("story-2", 10)] {
            let lock = lock.clone();
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                lock.run_with_lock(key, || async {
                    log.lock().unwrap().push(format!("{}:start", key));
                    tokio::time::sleep(Duration::from_millis(hold_ms)).await;
                    log.lock().unwrap().push(format!("{}:end", key));
                })
                .await;
            }));
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec!["story-1:start", "story-2:start", "story-2:end", "story-1:end"]
        );
    }

    #[tokio::test]
    async fn lock_is_released_after_an_error() {
        let lock = KeyedLock::new();

        let failed: Result<(), &str> = lock.run_with_lock("k", || async { Err("boom") }).await;
        let succeeded: Result<u32, &str> = lock.run_with_lock("k", || async { Ok(7) }).await;

        assert!(failed.is_err());
        assert_eq!(succeeded, Ok(7));
    }

    #[tokio::test]
    async fn idle_keys_are_pruned() {
        let lock = KeyedLock::new();

        lock.run_with_lock("k", || async {}).await;

        assert_eq!(lock.active_keys(), 0);
    }
}
