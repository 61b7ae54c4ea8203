use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("type name must not be empty")]
    EmptyTypeName,

    #[error("invalid object name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("recipe has no block named {0:?}")]
    MissingBlock(String),

    #[error("recipe block {block:?} is invalid: {reason}")]
    InvalidBlock { block: String, reason: String },
}
