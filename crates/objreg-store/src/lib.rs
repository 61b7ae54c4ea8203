//! Named in-process object registry.
//!
//! This crate holds dynamically created domain objects under unique string
//! names. Each stored value is wrapped in an [`ObjectRecord`] that remembers
//! its type, the recipe it was built from, and the records it was built
//! from.
//!
//! # Design Rules
//!
//! 1. Names are unique within one [`ObjectRegistry`] at any instant.
//! 2. Replacing or removing a record releases the old value's resources
//!    before the mutation returns (see [`Releasable`]).
//! 3. Reads never block on writers: they load an immutable snapshot.
//! 4. Mutations are serialized by one mutex per registry.
//! 5. Listeners are notified after the mutation's lock is released.

pub mod error;
pub mod events;
pub mod record;
pub mod registry;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use events::{InsertOutcome, ListenerId, RegistryListener};
pub use record::ObjectRecord;
pub use registry::ObjectRegistry;
pub use value::{downcast_value, AsAny, Releasable, ResultContainer, StoredValue};
