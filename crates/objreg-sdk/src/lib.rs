//! High-level SDK for objreg.
//!
//! A [`Workspace`] bundles an object registry, a creator registry and the
//! persistence coordinator behind one explicitly constructed value. There
//! is no process-wide instance; construct one per use and pass it around.

pub mod config;
pub mod error;
pub mod kinds;
pub mod workspace;

pub use config::{DefaultEntry, WorkspaceConfig};
pub use error::{SdkError, SdkResult};
pub use kinds::{Buffer, BuiltinKinds, BuiltinTypes, Computed, Scalar, Vector, MAX_BUFFER_SIZE};
pub use workspace::Workspace;

// Re-export key types
pub use objreg_creators::{CreatorRegistry, CreatorTableBuilder, ObjectFactory};
pub use objreg_persist::{
    BatchReport, InMemoryStream, JsonLinesReader, JsonLinesWriter, LoadOutcome, LoadSelector,
};
pub use objreg_store::{InsertOutcome, ObjectRecord, ObjectRegistry, StoredValue};
pub use objreg_types::{Recipe, TypeDescriptor};
