//! # Order engine public API
//!
//! The `oe_api` module exposes the programmatic API of the order engine. Each API object is created by supplying a
//! backend that implements the traits it needs (see [`crate::traits`]). [`crate::SqliteDatabase`] implements all of
//! the storage traits.
//!
//! * [`ingest_api`] records polled orders (and transition results) as new states.
//! * [`order_flow_api`] drives confirm, complete and cancel against the booking system.
//! * [`shop_orders_api`] serves the shop-facing reads: new orders from the buffer, and persisted orders.
//! * [`reminder_api`] finds orders that have been left unacknowledged too long.
//! * [`credential_cache`] keeps corporation credentials in memory.
//! * [`order_buffer`] is the per-shop mailbox of polled orders.
//!
//! ```rust,ignore
//! use rx_order_engine::{ShopOrdersApi, OrderBuffer, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(url, 5).await?;
//! let api = ShopOrdersApi::new(db, OrderBuffer::new());
//! let orders = api.get_all_orders("shop-1").await?;
//! ```
pub mod credential_cache;
pub mod errors;
pub mod ingest_api;
pub mod order_buffer;
pub mod order_flow_api;
pub mod order_locks;
pub mod order_objects;
pub mod reminder_api;
pub mod retry;
pub mod shop_orders_api;
