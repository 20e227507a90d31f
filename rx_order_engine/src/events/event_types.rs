use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::db_types::NewOrder;

/// Published once per successful poll that returned at least one order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdersReceivedEvent {
    pub shop_id: String,
    pub received_at: DateTime<Utc>,
    pub orders: Vec<NewOrder>,
    /// The orders exactly as the booking system sent them, fields the engine does not model included. Empty when the
    /// producer did not keep them.
    pub payloads: Vec<Value>,
}

impl OrdersReceivedEvent {
    pub fn new(shop_id: String, orders: Vec<NewOrder>) -> Self {
        Self { shop_id, received_at: Utc::now(), orders, payloads: Vec::new() }
    }

    pub fn with_payloads(mut self, payloads: Vec<Value>) -> Self {
        self.payloads = payloads;
        self
    }
}
