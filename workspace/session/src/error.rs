use common::PeriodError;
use thiserror::Error;

/// Failure talking to the forecasting backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// An endpoint URL could not be built from the configured base
    #[error("Invalid API URL: {0}")]
    Url(String),

    /// The task running the call ended without a response (panic, abort)
    #[error("Backend task failed: {0}")]
    Task(String),
}

/// Misuse of the dataset store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `update_entity` was called for a key the store has never seen
    #[error("Unknown part number '{0}'")]
    UnknownEntity(String),
}

/// Errors returned to callers of the dashboard commands.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No part number is selected")]
    NoActiveEntity,

    #[error("Part number '{0}' has no historical data to extend")]
    EmptyHistory(String),

    #[error(transparent)]
    Period(#[from] PeriodError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
