use thiserror::Error;

use crate::{
    db_types::{OrderKey, OrderStatus},
    traits::OrderStoreError,
};

/// Everything that can go wrong in a shop-facing order operation.
///
/// Each variant is a distinct outcome for the caller. In particular [`OrderFlowError::Expired`] (the order is gone
/// remotely) and [`OrderFlowError::NotAllowed`] (the order is closed locally) are kept apart.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Shop {0} does not exist")]
    ShopNotFound(String),
    #[error("Corporation #{0} does not exist")]
    CorporationNotFound(i64),
    #[error("There are no new orders for shop {0}")]
    NoNewOrders(String),
    #[error("Order {key} is {current}. It cannot become {target}")]
    NotAllowed { key: OrderKey, current: OrderStatus, target: OrderStatus },
    #[error("Order {0} has expired or was closed in the booking system")]
    Expired(OrderKey),
    #[error("Gave up pushing order {key} after {attempts} attempts")]
    GaveUp { key: OrderKey, attempts: u32 },
    #[error("Booking system failure: {0}")]
    GatewayFailure(String),
    #[error("Invalid request: {0}")]
    ValidationFailure(String),
    #[error("Could not save order state: {0}")]
    PersistenceFailure(String),
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::ShopNotFound(shop) => OrderFlowError::ShopNotFound(shop),
            OrderStoreError::CorporationNotFound(id) => OrderFlowError::CorporationNotFound(id),
            OrderStoreError::OrderClosed(key, current) => {
                OrderFlowError::PersistenceFailure(format!("Order {key} is already {current}"))
            },
            e => OrderFlowError::PersistenceFailure(e.to_string()),
        }
    }
}
