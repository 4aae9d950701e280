//! Instrumentation error types.

use event_depot::DepotError;
use splyt_config_and_utils::SplytError;
use thiserror::Error;

/// Instrumentation error type.
#[derive(Error, Debug)]
pub enum InstrumentationError {
    /// No device ID is set, so the data point cannot be attributed.
    #[error("No device id set")]
    MissingId,

    /// An argument was rejected before reaching the depot.
    #[error("Invalid argument: {0}")]
    InvalidArgs(String),

    /// The depot refused the event.
    #[error(transparent)]
    Depot(#[from] DepotError),
}

impl From<&InstrumentationError> for SplytError {
    fn from(err: &InstrumentationError) -> Self {
        match err {
            InstrumentationError::MissingId => SplytError::MissingId,
            InstrumentationError::InvalidArgs(_) => SplytError::InvalidArgs,
            InstrumentationError::Depot(e) => SplytError::from(e),
        }
    }
}

/// Result type alias using InstrumentationError.
pub type InstrumentationResult<T> = Result<T, InstrumentationError>;
