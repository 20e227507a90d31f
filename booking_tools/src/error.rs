use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the booking system: {0}")]
    Transport(String),
    #[error("Booking system failed with status {status}. {message}")]
    ServerError { status: u16, message: String },
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}

impl BookingApiError {
    /// Network failures and 5xx responses are worth retrying. Everything else will fail the same way next time.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ServerError { .. })
    }
}
