use thiserror::Error;

/// Errors raised by stream readers and writers.
#[derive(Debug, Error)]
pub enum PersistError {
    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stream refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for stream operations.
pub type PersistResult<T> = Result<T, PersistError>;
