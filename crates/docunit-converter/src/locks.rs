//! Per-document serialization of service operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use docunit_store::DocumentKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = HashMap<DocumentKey, Arc<AsyncMutex<()>>>;

/// One async mutex per document key.
///
/// Operations on the same key run one after another; different keys never
/// wait on each other. A key's entry lives only while a guard holds it or a
/// caller waits for it.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<LockTable>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: &DocumentKey) -> KeyGuard<'_> {
        let lock = Arc::clone(self.table().entry(key.clone()).or_default());
        let guard = lock.lock_owned().await;
        KeyGuard {
            locks: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, LockTable> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table().len()
    }
}

/// Exclusive access to one key; the key's entry is dropped with the last holder.
pub(crate) struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: DocumentKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release first so the table holds the only other reference when idle.
        drop(self.guard.take());
        let mut table = self.locks.table();
        if table
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = KeyedLocks::new();
        let key = DocumentKey::new(Uuid::new_v4(), "a.docx");

        let guard = locks.lock(&key).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.lock(&key)).await;
        drop(guard);

        assert!(second.is_err());
        let _again = locks.lock(&key).await;
    }

    #[tokio::test]
    async fn test_different_keys_do_not_wait() {
        let locks = KeyedLocks::new();
        let unit = Uuid::new_v4();

        let _a = locks.lock(&DocumentKey::new(unit, "a.docx")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(20),
            locks.lock(&DocumentKey::new(unit, "b.docx")),
        )
        .await;

        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_keys_leave_no_entries() {
        let locks = KeyedLocks::new();
        let unit = Uuid::new_v4();

        for name in ["a.docx", "b.docx", "c.docx"] {
            let _guard = locks.lock(&DocumentKey::new(unit, name)).await;
            assert_eq!(locks.len(), 1);
        }

        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_entry_kept_while_another_caller_waits() {
        let locks = KeyedLocks::new();
        let key = DocumentKey::new(Uuid::new_v4(), "a.docx");

        let first = locks.lock(&key).await;
        let waiting = locks.lock(&key);
        tokio::pin!(waiting);
        assert!(
            tokio::time::timeout(Duration::from_millis(20), &mut waiting)
                .await
                .is_err()
        );

        drop(first);
        assert_eq!(locks.len(), 1);

        let second = waiting.await;
        assert_eq!(locks.len(), 1);
        drop(second);
        assert_eq!(locks.len(), 0);
    }
}
