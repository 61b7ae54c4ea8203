//! Capabilities of stored values.
//!
//! A stored value is opaque to the registry. It opts into the two behaviors
//! the registry cares about through narrow traits instead of runtime
//! probing:
//!
//! - [`Releasable`] — the value owns resources that must be freed as soon as
//!   it is replaced or removed.
//! - [`ResultContainer`] — the value wraps another value with metadata; typed
//!   lookups see through one level of wrapping.

use std::any::Any;
use std::sync::Arc;

/// Type-erasure helpers. Implemented for every `Any + Send + Sync` type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A value that can live in an [`ObjectRegistry`](crate::ObjectRegistry).
///
/// Both capability hooks default to `None`; a plain data type needs only an
/// empty `impl StoredValue for T {}`.
pub trait StoredValue: AsAny {
    /// The release capability, if this value owns resources.
    fn as_releasable(&self) -> Option<&dyn Releasable> {
        None
    }

    /// The wrapped value, if this value is a result container.
    fn as_result(&self) -> Option<&dyn ResultContainer> {
        None
    }
}

/// Explicit resource release.
///
/// Called at most once per record, while the registry's write lock is held.
pub trait Releasable {
    fn release(&self);
}

/// A value that carries another value plus metadata.
pub trait ResultContainer {
    fn inner(&self) -> Arc<dyn StoredValue>;
}

/// Downcast a stored value to `T`, unwrapping one result container level.
pub fn downcast_value<T: StoredValue>(value: &Arc<dyn StoredValue>) -> Option<Arc<T>> {
    if let Ok(typed) = Arc::clone(value).into_any().downcast::<T>() {
        return Some(typed);
    }
    let inner = value.as_result()?.inner();
    inner.into_any().downcast::<T>().ok()
}
