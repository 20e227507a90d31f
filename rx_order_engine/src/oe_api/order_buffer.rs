//! The per-shop mailbox of orders that have been polled but not yet handed to the shop.
//!
//! The buffer lives in process memory only. Anything in it is lost on restart, which is acceptable because the
//! booking system stays the source of truth and the orders are persisted independently of the buffer.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use log::*;

use crate::db_types::NewOrder;

#[derive(Debug, Clone, Default)]
pub struct OrderBuffer {
    shops: Arc<Mutex<HashMap<String, Vec<NewOrder>>>>,
}

impl OrderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `orders` to the shop's queue.
    pub fn enqueue(&self, shop_id: &str, orders: Vec<NewOrder>) {
        if orders.is_empty() {
            return;
        }
        let count = orders.len();
        let mut shops = self.lock();
        let queue = shops.entry(shop_id.to_string()).or_default();
        queue.extend(orders);
        debug!("📥️ {count} orders buffered for shop {shop_id}. {} waiting in total", queue.len());
    }

    /// Removes and returns everything queued for the shop, or `None` if nothing is.
    pub fn drain(&self, shop_id: &str) -> Option<Vec<NewOrder>> {
        let orders = self.lock().remove(shop_id).filter(|q| !q.is_empty());
        if let Some(orders) = &orders {
            debug!("📥️ Handing {} buffered orders to shop {shop_id}", orders.len());
        }
        orders
    }

    pub fn pending(&self, shop_id: &str) -> usize {
        self.lock().get(shop_id).map(Vec::len).unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<NewOrder>>> {
        // A panic elsewhere cannot leave the map half-updated, so a poisoned lock is still usable.
        self.shops.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
