use objreg_types::TypeError;

/// Errors from record construction and registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The record name failed validation.
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// A record listed a dependency carrying its own name.
    #[error("object {0:?} cannot depend on an object with its own name")]
    SelfDependency(String),

    /// The named object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
