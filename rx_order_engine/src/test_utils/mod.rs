//! Helpers for tests in this crate and its dependents. Enabled with the `test_utils` feature.
pub mod prepare_env;
pub mod scripted_gateway;

pub use scripted_gateway::ScriptedGateway;
