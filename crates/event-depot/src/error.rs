//! Event depot error types.

use splyt_config_and_utils::SplytError;
use thiserror::Error;

/// Errors from the persistent archive and its blob stores.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Nothing stored under the key.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Stored bytes could not be decoded.
    #[error("Corrupt data under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Value could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ArchiveError.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Event depot error type.
#[derive(Error, Debug)]
pub enum DepotError {
    /// `init` has not been called on this depot.
    #[error("Event depot is not initialized")]
    NotInitialized,

    /// The worker has shut down and no longer accepts jobs.
    #[error("Event depot has stopped")]
    Stopped,

    /// Configuration values are out of range.
    #[error("Invalid depot configuration: {0}")]
    InvalidConfig(String),

    /// The worker thread could not be started.
    #[error("Failed to start depot worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker thread panicked.
    #[error("Depot worker panicked")]
    WorkerPanicked,
}

impl From<&DepotError> for SplytError {
    fn from(err: &DepotError) -> Self {
        match err {
            DepotError::NotInitialized | DepotError::Stopped => SplytError::NotInitialized,
            DepotError::InvalidConfig(_) => SplytError::InvalidArgs,
            DepotError::Spawn(_) | DepotError::WorkerPanicked => SplytError::Generic,
        }
    }
}

/// Result type alias using DepotError.
pub type DepotResult<T> = Result<T, DepotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depot_errors_map_onto_taxonomy() {
        assert_eq!(SplytError::from(&DepotError::NotInitialized), SplytError::NotInitialized);
        assert_eq!(SplytError::from(&DepotError::Stopped), SplytError::NotInitialized);
        assert_eq!(
            SplytError::from(&DepotError::InvalidConfig("bin size".into())),
            SplytError::InvalidArgs
        );
        assert_eq!(SplytError::from(&DepotError::WorkerPanicked), SplytError::Generic);
    }
}
