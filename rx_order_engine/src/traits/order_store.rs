use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{DrugInfo, FullOrder, InsertStateResult, NewOrder, OrderKey, OrderStatus};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} is already {1}. No further states can be recorded")]
    OrderClosed(OrderKey, OrderStatus),
    #[error("Shop {0} does not exist")]
    ShopNotFound(String),
    #[error("Corporation #{0} does not exist")]
    CorporationNotFound(i64),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// Persistence of orders and their append-only state histories.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Records `order` as the newest state of the order it identifies, in a single atomic transaction:
    /// * the order row is created on first sighting, otherwise the existing one is reused untouched,
    /// * one state row is appended,
    /// * one line item row is inserted per item, named from the matching entry in `drugs`.
    ///
    /// `drugs` must be parallel to `order.items`. If the order's current state is terminal, nothing is written and
    /// [`OrderStoreError::OrderClosed`] is returned.
    async fn record_order_state(
        &self,
        order: &NewOrder,
        drugs: &[DrugInfo],
    ) -> Result<InsertStateResult, OrderStoreError>;

    /// Fetches the order with its full state history, or `None` if it has never been seen.
    async fn fetch_order(&self, key: &OrderKey) -> Result<Option<FullOrder>, OrderStoreError>;

    /// All orders for the shop, oldest first.
    async fn fetch_orders_for_shop(&self, shop_id: &str) -> Result<Vec<FullOrder>, OrderStoreError>;

    /// Orders for the shop whose order id ends with `suffix` (ASCII case-insensitive).
    async fn search_orders_by_suffix(&self, shop_id: &str, suffix: &str) -> Result<Vec<FullOrder>, OrderStoreError>;

    /// Orders that have exactly one recorded state, with that state being `status` and timestamped strictly before
    /// `before`.
    async fn fetch_single_state_orders(
        &self,
        status: OrderStatus,
        before: DateTime<Utc>,
    ) -> Result<Vec<OrderKey>, OrderStoreError>;
}
