use thiserror::Error;

/// Errors raised by the store port and its adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a whole push operation.
///
/// Per-endpoint delivery failures are not represented here; they are
/// reported as [`crate::push::DeliveryOutcome`]s and only counted.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid delivery option: {0}")]
    InvalidOption(String),

    #[error("maximum subscriptions reached ({max})")]
    CapacityExceeded { max: usize },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("push notifications are not configured: {0}")]
    Configuration(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
