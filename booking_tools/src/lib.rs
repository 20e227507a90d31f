//! # Booking tools
//!
//! A thin client for the two endpoints of the external booking system that the order engine depends on:
//!
//! * `pull` returns the orders that are new for a shop since the last pull.
//! * `update` accepts a new state for an order (confirmation, completion, cancellation).
//!
//! Every request carries HTTP Basic credentials of the corporation that owns the shop, and the fixed `User-Agent` the
//! remote system expects. Nothing in this crate knows about persistence or the order lifecycle; it only moves wire
//! payloads and classifies responses.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::BookingApi;
pub use config::{BookingConfig, StateLabels};
pub use data_objects::{BookingItem, BookingOrder, PushStatus};
pub use error::BookingApiError;
