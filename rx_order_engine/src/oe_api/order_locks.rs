use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::OwnedMutexGuard;

use crate::db_types::OrderKey;

type LockTable = Arc<Mutex<HashMap<OrderKey, Arc<tokio::sync::Mutex<()>>>>>;

/// Serialises transitions on the same order. Entries are created on demand and removed once nobody holds or waits on
/// them, so the table only ever contains orders that are mid-transition.
#[derive(Debug, Clone, Default)]
pub struct OrderLocks {
    table: LockTable,
}

/// Releases the order's lock when dropped.
pub struct OrderLockGuard {
    key: OrderKey,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &OrderKey) -> OrderLockGuard {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(|p| p.into_inner());
            table.entry(key.clone()).or_default().clone()
        };
        let guard = mutex.lock_owned().await;
        OrderLockGuard { key: key.clone(), table: self.table.clone(), guard: Some(guard) }
    }

    /// The number of orders currently locked or waited on.
    pub fn active(&self) -> usize {
        self.table.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut table = self.table.lock().unwrap_or_else(|p| p.into_inner());
        // Only the table's own reference left: nobody is waiting.
        if table.get(&self.key).is_some_and(|m| Arc::strong_count(m) == 1) {
            table.remove(&self.key);
        }
    }
}
