//! # Rx order server
//! This crate hosts the process around the order engine. It is responsible for:
//! * Polling the booking system for new orders for every logged-in shop, and publishing them to the engine's
//!   consumers (the new-order buffer, persistence, and the notifier).
//! * Periodically reminding operators about orders nobody has acted on.
//! * Serving the shop-facing HTTP API over the engine's public operations.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `GET /shops/{shop_id}/orders/new`: orders polled since the shop last asked. Each order is returned once only.
//! * `GET /shops/{shop_id}/orders`: every stored order of the shop, at its current state.
//! * `GET /shops/{shop_id}/orders/search?suffix=..`: stored orders whose id ends with the suffix.
//! * `POST /shops/{shop_id}/orders/{order_id}/confirm|complete|cancel`: order transitions.
pub mod cli;
pub mod config;
pub mod consumers;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod notifier;
pub mod poll_worker;
pub mod reminder_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
