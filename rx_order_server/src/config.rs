use std::{env, fmt::Display, str::FromStr, time::Duration};

use booking_tools::BookingConfig;
use log::*;
use rx_order_engine::RetryPolicy;

const DEFAULT_RXO_HOST: &str = "127.0.0.1";
const DEFAULT_RXO_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/rx_orders.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_POLL_CONCURRENCY: usize = 8;
const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_REMINDER_THRESHOLD_MINUTES: u64 = 40;
const DEFAULT_NOTIFIER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Where the booking system lives and how to talk to it, including its state labels.
    pub booking: BookingConfig,
    /// Time between two polls of the booking system.
    pub poll_interval: Duration,
    /// Maximum number of shops polled at the same time. Shops beyond this wait for a free slot.
    pub poll_concurrency: usize,
    pub reminder_interval: Duration,
    /// How long an order may sit in its first `New` state before a reminder goes out.
    pub reminder_threshold: Duration,
    /// Notifications are disabled when this is `None`.
    pub notifier_url: Option<String>,
    pub notifier_timeout: Duration,
    pub push_retry: RetryPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RXO_HOST.to_string(),
            port: DEFAULT_RXO_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            booking: BookingConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_concurrency: DEFAULT_POLL_CONCURRENCY,
            reminder_interval: DEFAULT_REMINDER_INTERVAL,
            reminder_threshold: Duration::from_secs(DEFAULT_REMINDER_THRESHOLD_MINUTES * 60),
            notifier_url: None,
            notifier_timeout: DEFAULT_NOTIFIER_TIMEOUT,
            push_retry: RetryPolicy::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("RXO_HOST").ok().unwrap_or_else(|| DEFAULT_RXO_HOST.into());
        let port = env_or_default("RXO_PORT", DEFAULT_RXO_PORT);
        let database_url = env::var("RXO_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ RXO_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env_or_default("RXO_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let booking = BookingConfig::new_from_env_or_default();
        let poll_interval = Duration::from_secs(env_or_default("RXO_POLL_INTERVAL", DEFAULT_POLL_INTERVAL.as_secs()));
        let poll_concurrency = match env_or_default("RXO_POLL_CONCURRENCY", DEFAULT_POLL_CONCURRENCY) {
            0 => {
                warn!("🪛️ RXO_POLL_CONCURRENCY must be at least 1. Using {DEFAULT_POLL_CONCURRENCY}.");
                DEFAULT_POLL_CONCURRENCY
            },
            n => n,
        };
        let reminder_interval =
            Duration::from_secs(env_or_default("RXO_REMINDER_INTERVAL", DEFAULT_REMINDER_INTERVAL.as_secs()));
        let reminder_threshold =
            Duration::from_secs(60 * env_or_default("RXO_REMINDER_THRESHOLD", DEFAULT_REMINDER_THRESHOLD_MINUTES));
        let notifier_url = env::var("RXO_NOTIFIER_URL").ok().filter(|s| !s.trim().is_empty());
        if notifier_url.is_none() {
            info!("🪛️ RXO_NOTIFIER_URL is not set. Order and reminder notifications are disabled.");
        }
        let push_retry = RetryPolicy::new(
            env_or_default("RXO_PUSH_MAX_ATTEMPTS", defaults.push_retry.max_attempts),
            Duration::from_millis(env_or_default(
                "RXO_PUSH_INITIAL_BACKOFF_MS",
                defaults.push_retry.initial_backoff.as_millis() as u64,
            )),
            Duration::from_millis(env_or_default(
                "RXO_PUSH_MAX_BACKOFF_MS",
                defaults.push_retry.max_backoff.as_millis() as u64,
            )),
        );
        if push_retry.max_attempts == 0 {
            warn!("🪛️ RXO_PUSH_MAX_ATTEMPTS is 0. Transitions will retry pushes until the booking system answers.");
        }
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            booking,
            poll_interval,
            poll_concurrency,
            reminder_interval,
            reminder_threshold,
            notifier_url,
            notifier_timeout: defaults.notifier_timeout,
            push_retry,
        }
    }
}

/// Parses `var` from the environment, falling back to `default` (with a log) if it is missing or invalid.
fn env_or_default<T>(var: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(var) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {var} is not set. Using the default, {default}.");
            default
        },
    }
}
