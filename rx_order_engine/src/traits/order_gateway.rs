use rx_common::Credentials;
use thiserror::Error;

use crate::db_types::NewOrder;

/// A decisive answer from the booking system to an order update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Accepted,
    /// The booking system no longer recognises the order. It expired or was closed remotely.
    Stale,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Network failure or a 5xx. The same request may well succeed later.
    #[error("Transient booking system failure: {0}")]
    Transient(String),
    /// Anything else. Retrying will not help.
    #[error("Booking system rejected the request: {0}")]
    Fatal(String),
}

/// Outbound order updates to the external booking system.
#[allow(async_fn_in_trait)]
pub trait OrderGateway {
    async fn push_order_update(&self, credentials: &Credentials, order: &NewOrder)
        -> Result<PushOutcome, GatewayError>;
}
