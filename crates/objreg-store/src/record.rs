use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use objreg_types::{validate_object_name, Recipe, TypeDescriptor};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::value::{downcast_value, StoredValue};

/// One stored value together with its identity and origin.
///
/// Records are shared as `Arc<ObjectRecord>`; two records are "the same"
/// only if they are the same allocation (see [`ObjectRecord::same_as`]).
/// Everything except the release flag is immutable after construction, so
/// a dependency graph built from records can never contain a reference
/// cycle.
pub struct ObjectRecord {
    name: String,
    type_desc: TypeDescriptor,
    value: Arc<dyn StoredValue>,
    recipe: Recipe,
    dependencies: Vec<Arc<ObjectRecord>>,
    created_at: DateTime<Utc>,
    released: AtomicBool,
}

impl ObjectRecord {
    /// Build a record stamped with the current time.
    ///
    /// Fails if `name` is not a valid object name or if any dependency
    /// carries the same name as the record itself.
    pub fn new(
        name: impl Into<String>,
        type_desc: TypeDescriptor,
        value: Arc<dyn StoredValue>,
        recipe: Recipe,
        dependencies: Vec<Arc<ObjectRecord>>,
    ) -> StoreResult<Arc<Self>> {
        let name = name.into();
        validate_object_name(&name)?;
        if dependencies.iter().any(|dep| dep.name == name) {
            return Err(StoreError::SelfDependency(name));
        }
        Ok(Arc::new(Self {
            name,
            type_desc,
            value,
            recipe,
            dependencies,
            created_at: Utc::now(),
            released: AtomicBool::new(false),
        }))
    }

    /// Shorthand for a record with an empty recipe and no dependencies.
    pub fn standalone(
        name: impl Into<String>,
        type_desc: TypeDescriptor,
        value: Arc<dyn StoredValue>,
    ) -> StoreResult<Arc<Self>> {
        Self::new(name, type_desc, value, Recipe::new(), Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_desc(&self) -> &TypeDescriptor {
        &self.type_desc
    }

    pub fn value(&self) -> &Arc<dyn StoredValue> {
        &self.value
    }

    /// The value as `T`, seeing through one result-container level.
    pub fn value_as<T: StoredValue>(&self) -> Option<Arc<T>> {
        downcast_value(&self.value)
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn dependencies(&self) -> &[Arc<ObjectRecord>] {
        &self.dependencies
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` if `other` is this exact record.
    pub fn same_as(&self, other: &ObjectRecord) -> bool {
        std::ptr::eq(self, other)
    }

    /// Release the value's resources if it is [`Releasable`](crate::Releasable).
    ///
    /// Only the first call has an effect. Returns `true` if this call was
    /// the one that marked the record released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(releasable) = self.value.as_releasable() {
            debug!(name = %self.name, kind = %self.type_desc, "releasing object resources");
            releasable.release();
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ObjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deps: Vec<&str> = self.dependencies.iter().map(|d| d.name()).collect();
        f.debug_struct("ObjectRecord")
            .field("name", &self.name)
            .field("type", &self.type_desc)
            .field("dependencies", &deps)
            .field("created_at", &self.created_at)
            .field("released", &self.is_released())
            .finish()
    }
}
