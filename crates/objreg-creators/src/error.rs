//! Error types for the creator table and for factories.

use objreg_store::StoreError;
use objreg_types::TypeError;
use thiserror::Error;
use uuid::Uuid;

/// Consistency failures of the creator table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreatorError {
    /// Two registrations share a type id.
    #[error("duplicate creator for type id {id}: {existing:?} and {duplicate:?}")]
    DuplicateTypeId {
        id: Uuid,
        existing: String,
        duplicate: String,
    },

    /// Two registrations share a type name.
    #[error("duplicate creator for type name {name:?}")]
    DuplicateTypeName { name: String },
}

/// Convenience alias for creator table results.
pub type CreatorResult<T> = Result<T, CreatorError>;

/// Failures reported by a factory while building objects from a recipe.
#[derive(Debug, Error)]
pub enum CreateError {
    /// The recipe references an object that is not in the registry.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// The recipe is malformed.
    #[error("invalid recipe: {0}")]
    InvalidRecipe(#[from] TypeError),

    /// The produced record could not be constructed.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] StoreError),

    /// Any other factory-specific failure.
    #[error("{0}")]
    Failed(String),
}
