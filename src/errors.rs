use chrono::{DateTime, Utc};

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while detecting, replaying or trading.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The history is shorter than the warm-up window.
    #[error("Insufficient data: {required} observations required, {available} available")]
    InsufficientData {
        /// Observations the warm-up needs.
        required: usize,
        /// Observations in the history.
        available: usize,
    },

    /// The history provided is empty. Replaying requires at least one observation.
    #[error("History is empty: replaying requires at least one observation")]
    EmptyHistory,

    /// The requested resolution is not one of the supported granularities.
    #[error("Resolution {0} is not supported, choose one of: 5m, 15m, 30m, 2h, 4h, 24h")]
    InvalidResolution(String),

    /// The replayed history was recorded at another resolution.
    #[error("Resolution mismatch: history is {expected}, requested {requested}")]
    ResolutionMismatch {
        /// Resolution of the history.
        expected: String,
        /// Resolution asked for.
        requested: String,
    },

    /// Observations are not in non-decreasing timestamp order.
    #[error("Timestamps out of order at index {index}: {current} comes after {previous}")]
    NonMonotonicTimestamps {
        /// Position of the offending observation.
        index: usize,
        /// Timestamp of the observation before it.
        previous: DateTime<Utc>,
        /// Its own, older timestamp.
        current: DateTime<Utc>,
    },

    /// The spacing between generated observations is negative or overflows.
    #[error("Invalid step between observations: {0}")]
    InvalidStep(chrono::Duration),

    /// The fee must be a finite, non-negative amount of basis points below 10 000.
    #[error("Invalid fee: {0} bps")]
    InvalidFee(f64),

    /// A price must be positive and finite.
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    /// An order amount must be positive and finite.
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    /// The initial balance is not positive.
    #[error("Balance must be positive (got: {0})")]
    NegZeroBalance(f64),

    /// The wallet does not have enough funds to execute the order.
    /// Expected: {0}, Available: {1}
    #[error("Insufficient funds: required {0}, available {1}")]
    InsufficientFunds(f64, f64),

    /// A required builder field was not set.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The external venue rejected a request.
    #[error("Venue error: {0}")]
    Venue(String),

    /// I/O error occurred.
    // utils.rs
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error occurred.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
