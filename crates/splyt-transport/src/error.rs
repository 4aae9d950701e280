//! Transport error types.

use splyt_config_and_utils::SplytError;
use thiserror::Error;

/// Transport error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("Request timed out")]
    Timeout,

    /// Connection or body transfer failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Anything else, including non-200 responses.
    #[error("Request failed: {0}")]
    Generic(String),
}

impl From<&TransportError> for SplytError {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout => SplytError::RequestTimedOut,
            TransportError::Io(_) | TransportError::Generic(_) => SplytError::Generic,
        }
    }
}

/// Result type alias using TransportError.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_request_timed_out() {
        assert_eq!(SplytError::from(&TransportError::Timeout), SplytError::RequestTimedOut);
        assert_eq!(
            SplytError::from(&TransportError::Io("reset".into())),
            SplytError::Generic
        );
        assert_eq!(
            SplytError::from(&TransportError::Generic("HTTP 500".into())),
            SplytError::Generic
        );
    }
}
