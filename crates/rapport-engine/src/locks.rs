//! Per-key async mutexes.
//!
//! Each user id maps to its own `tokio::sync::Mutex`, so updates for one user
//! queue behind each other while different users never contend. Entries that
//! nobody holds or waits on are pruned on the next acquisition.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
  inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
  /// Wait for exclusive access to `key`. Released when the guard drops.
  pub(crate) async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
    let lock = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      map.retain(|k, l| k == key || Arc::strong_count(l) > 1);
      Arc::clone(map.entry(key.to_owned()).or_default())
    };
    lock.lock_owned().await
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_key_is_exclusive() {
    let locks = Arc::new(KeyedLocks::default());
    let guard = locks.acquire("alice").await;

    let waiter = {
      let locks = Arc::clone(&locks);
      tokio::spawn(async move { locks.acquire("alice").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    let _second = waiter.await.unwrap();
  }

  #[tokio::test]
  async fn different_keys_do_not_block() {
    let locks = KeyedLocks::default();
    let _a = locks.acquire("alice").await;
    let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("bob"))
      .await
      .expect("bob must not wait on alice");
  }

  #[tokio::test]
  async fn idle_entries_are_pruned() {
    let locks = KeyedLocks::default();
    for user in ["a", "b", "c"] {
      drop(locks.acquire(user).await);
    }
    let _held = locks.acquire("d").await;
    assert_eq!(locks.len(), 1);
  }
}
