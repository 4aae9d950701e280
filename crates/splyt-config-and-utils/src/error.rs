//! Error types shared across the Splyt crates.

use thiserror::Error;

/// Error codes reported by the SDK and by the data collector.
///
/// Success is represented by `Ok(())`; the numeric codes match the values
/// used on the wire (`0` meaning success).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplytError {
    /// An unspecified error occurred.
    #[error("generic error")]
    Generic,

    /// The SDK (or the event depot) has not been initialized.
    #[error("not initialized")]
    NotInitialized,

    /// Invalid arguments were passed to a method.
    #[error("invalid arguments")]
    InvalidArgs,

    /// The device or user ID is missing or invalid.
    #[error("missing or invalid id")]
    MissingId,

    /// A web request timed out.
    #[error("request timed out")]
    RequestTimedOut,

    /// A code that could not be mapped onto a known error.
    #[error("unknown error")]
    Unknown,
}

impl SplytError {
    /// Wire value of the error.
    pub fn code(self) -> i64 {
        match self {
            Self::Generic => -1,
            Self::NotInitialized => -2,
            Self::InvalidArgs => -3,
            Self::MissingId => -4,
            Self::RequestTimedOut => -5,
            Self::Unknown => -6,
        }
    }

    /// Map a wire value back onto the taxonomy.
    ///
    /// `0` is success; any value that is not a known code becomes
    /// [`SplytError::Unknown`].
    pub fn from_code(code: i64) -> Result<(), SplytError> {
        match code {
            0 => Ok(()),
            -1 => Err(Self::Generic),
            -2 => Err(Self::NotInitialized),
            -3 => Err(Self::InvalidArgs),
            -4 => Err(Self::MissingId),
            -5 => Err(Self::RequestTimedOut),
            _ => Err(Self::Unknown),
        }
    }
}

/// Error type for configuration and filesystem helpers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Path error (e.g., home directory not found)
    #[error("Path error: {0}")]
    Path(String),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
