use std::time::Duration;

/// How hard the transition service tries to push an update through transient booking-system failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total push attempts before giving up. Zero means keep trying until the booking system gives a decisive answer.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 10, initial_backoff: Duration::from_millis(500), max_backoff: Duration::from_secs(30) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self { max_attempts, initial_backoff, max_backoff }
    }

    pub fn unbounded(initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self::new(0, initial_backoff, max_backoff)
    }

    /// The delay after the `failures`-th consecutive transient failure: the initial backoff, doubled for every
    /// failure after the first, capped at `max_backoff`.
    pub fn backoff_for(&self, failures: u32) -> Duration {
        let shift = failures.saturating_sub(1).min(31);
        self.initial_backoff.checked_mul(1u32 << shift).unwrap_or(self.max_backoff).min(self.max_backoff)
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}
