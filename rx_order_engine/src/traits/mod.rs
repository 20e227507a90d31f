//! # Backend contracts
//!
//! The core never talks to SQLite or HTTP directly. It is written against these traits, and the concrete backends
//! (the SQLite store in [`crate::sqlite`], the booking-system adapter in the server crate) implement them.
//!
//! * [`OrderStore`] records and queries order state histories.
//! * [`ShopManagement`] exposes shops, their logged-in flag, and their corporation's credentials.
//! * [`DrugCatalog`] resolves drug ids to display names for line items.
//! * [`OrderGateway`] pushes order updates to the external booking system.
//!
//! [`OrderBackend`] bundles the three storage traits for code that needs all of them.
mod drug_catalog;
mod order_gateway;
mod order_store;
mod shop_management;

pub use drug_catalog::DrugCatalog;
pub use order_gateway::{GatewayError, OrderGateway, PushOutcome};
pub use order_store::{OrderStore, OrderStoreError};
pub use shop_management::ShopManagement;

/// Everything the transition service needs from storage. Implemented automatically.
pub trait OrderBackend: OrderStore + DrugCatalog + ShopManagement {}

impl<T> OrderBackend for T where T: OrderStore + DrugCatalog + ShopManagement {}
