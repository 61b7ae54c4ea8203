use std::fmt;
use std::sync::Arc;

use crate::record::ObjectRecord;
use crate::registry::ObjectRegistry;

/// Result of [`ObjectRegistry::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InsertOutcome {
    /// The name was new.
    Added,
    /// A record of the same name was overwritten (and its value released).
    Replaced,
    /// The record was absent or unusable; the registry is unchanged.
    Rejected,
}

impl InsertOutcome {
    /// Returns `true` unless the insert was rejected.
    pub fn is_stored(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl fmt::Display for InsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Replaced => "replaced",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Receives change notifications from an [`ObjectRegistry`].
///
/// Every callback runs on the mutating thread after the registry's write
/// lock has been released, so a listener may call back into the registry.
pub trait RegistryListener: Send + Sync {
    /// Fired for every insert attempt, including rejected ones (`record` is
    /// `None` when the caller passed no record).
    fn item_added(&self, _record: Option<&Arc<ObjectRecord>>, _outcome: InsertOutcome) {}

    /// Fired after a successful remove.
    fn item_removed(&self, _name: &str) {}

    /// Fired once after every clear.
    fn after_clear(&self, _registry: &ObjectRegistry) {}
}

/// Handle returned by [`ObjectRegistry::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);
