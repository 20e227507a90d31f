//! Rx Order Engine
//!
//! The order engine mirrors pharmacy orders from an external booking system, lets shops act on them, and reports
//! their actions back. This library contains the core logic and is independent of the HTTP server that hosts it.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@sqlite`]), behind the backend traits in [`mod@traits`]. The data types stored are defined in
//!    [`mod@db_types`] and are public.
//! 2. The public API ([`mod@oe_api`]): ingesting polled orders, confirm/complete/cancel transitions, the per-shop
//!    new-order buffer, shop-facing reads and the reminder scan.
//! 3. Events ([`mod@events`]). Every successful poll publishes an [`events::OrdersReceivedEvent`], which any number of
//!    consumers (persistence, the new-order buffer, notifications) can subscribe to independently.
pub mod db_types;
pub mod events;
pub mod oe_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use oe_api::{
    credential_cache::CredentialCache,
    errors::OrderFlowError,
    ingest_api::{IngestApi, UNKNOWN_DRUG_NAME},
    order_buffer::OrderBuffer,
    order_flow_api::OrderFlowApi,
    order_locks::OrderLocks,
    order_objects,
    reminder_api::ReminderApi,
    retry::RetryPolicy,
    shop_orders_api::ShopOrdersApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
