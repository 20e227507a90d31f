use std::time::Duration;

use log::*;

const DEFAULT_BOOKING_URL: &str = "http://localhost:8090/api";
const DEFAULT_USER_AGENT: &str = "rx-order-sync/1.0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Base url of the booking system API, without a trailing slash. e.g. "https://booking.example.com/api"
    pub base_url: String,
    /// The booking system rejects requests that don't carry the User-Agent it issued to us.
    pub user_agent: String,
    pub timeout: Duration,
    pub state_labels: StateLabels,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BOOKING_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            state_labels: StateLabels::default(),
        }
    }
}

impl BookingConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("RXO_BOOKING_URL").unwrap_or_else(|_| {
            warn!("📡️ RXO_BOOKING_URL not set, using (probably useless) default {DEFAULT_BOOKING_URL}");
            DEFAULT_BOOKING_URL.to_string()
        });
        let user_agent = std::env::var("RXO_BOOKING_USER_AGENT").unwrap_or_else(|_| {
            warn!("📡️ RXO_BOOKING_USER_AGENT not set, using {DEFAULT_USER_AGENT} as default");
            DEFAULT_USER_AGENT.to_string()
        });
        let timeout = std::env::var("RXO_BOOKING_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("📡️ Invalid configuration value for RXO_BOOKING_TIMEOUT. {e}")).ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let state_labels = StateLabels::from_env_or_default();
        Self { base_url: base_url.trim_end_matches('/').to_string(), user_agent, timeout, state_labels }
    }
}

/// The strings the booking system uses for each lifecycle state. They differ between deployments of the remote
/// system, so they are configuration rather than constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLabels {
    pub new: String,
    pub confirmed: String,
    pub completed: String,
    pub canceled: String,
}

impl Default for StateLabels {
    fn default() -> Self {
        Self {
            new: "New".to_string(),
            confirmed: "Confirmed".to_string(),
            completed: "Completed".to_string(),
            canceled: "Canceled".to_string(),
        }
    }
}

impl StateLabels {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let label =
            |var: &str, default: String| std::env::var(var).ok().filter(|s| !s.trim().is_empty()).unwrap_or(default);
        Self {
            new: label("RXO_STATE_NEW", defaults.new),
            confirmed: label("RXO_STATE_CONFIRMED", defaults.confirmed),
            completed: label("RXO_STATE_COMPLETED", defaults.completed),
            canceled: label("RXO_STATE_CANCELED", defaults.canceled),
        }
    }
}
