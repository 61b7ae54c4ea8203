use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use objreg_types::TypeDescriptor;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CreatorError, CreatorResult};
use crate::factory::{CreatorEntry, ObjectFactory};

/// Contributes factories to a [`CreatorRegistry`] on every rebuild.
///
/// Initializers run while the registry's rebuild lock is held and must not
/// call back into the same registry.
pub trait CreatorInitializer: Send + Sync {
    fn register(&self, table: &mut CreatorTableBuilder);
}

impl<F> CreatorInitializer for F
where
    F: Fn(&mut CreatorTableBuilder) + Send + Sync,
{
    fn register(&self, table: &mut CreatorTableBuilder) {
        self(table)
    }
}

/// Handle returned by [`CreatorRegistry::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// An immutable, fully built creator table.
#[derive(Default)]
pub struct CreatorTable {
    by_id: HashMap<Uuid, Arc<CreatorEntry>>,
    by_name: HashMap<String, Arc<CreatorEntry>>,
}

impl CreatorTable {
    pub fn get_by_id(&self, id: Uuid) -> Option<Arc<CreatorEntry>> {
        self.by_id.get(&id).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<CreatorEntry>> {
        self.by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registered types sorted by name.
    pub fn types(&self) -> Vec<TypeDescriptor> {
        let mut types: Vec<TypeDescriptor> =
            self.by_id.values().map(|e| e.type_desc.clone()).collect();
        types.sort_by(|a, b| a.name().cmp(b.name()));
        types
    }
}

/// Collects registrations during one rebuild pass.
///
/// Registration never fails on the spot; collisions are remembered and
/// reported when the pass completes.
#[derive(Default)]
pub struct CreatorTableBuilder {
    table: CreatorTable,
    collisions: Vec<CreatorError>,
}

impl CreatorTableBuilder {
    /// Register a factory for `type_desc`.
    pub fn register(&mut self, type_desc: TypeDescriptor, factory: impl ObjectFactory + 'static) {
        self.register_entry(CreatorEntry::new(type_desc, factory));
    }

    /// Register a prepared entry.
    pub fn register_entry(&mut self, entry: CreatorEntry) {
        let id = entry.type_desc.id();
        let name = entry.type_desc.name().to_string();

        if let Some(existing) = self.table.by_id.get(&id) {
            self.collisions.push(CreatorError::DuplicateTypeId {
                id,
                existing: existing.type_desc.name().to_string(),
                duplicate: name,
            });
            return;
        }
        if self.table.by_name.contains_key(&name) {
            self.collisions.push(CreatorError::DuplicateTypeName { name });
            return;
        }

        let entry = Arc::new(entry);
        self.table.by_id.insert(id, Arc::clone(&entry));
        self.table.by_name.insert(name, entry);
    }

    fn finish(self) -> CreatorResult<CreatorTable> {
        let mut collisions = self.collisions.into_iter();
        match collisions.next() {
            None => Ok(self.table),
            Some(first) => {
                for other in collisions {
                    warn!(error = %other, "additional creator collision");
                }
                Err(first)
            }
        }
    }
}

struct Inner {
    subscribers: Vec<(SubscriptionId, Arc<dyn CreatorInitializer>)>,
    next_id: u64,
    dirty: bool,
    table: Arc<CreatorTable>,
    rebuilds: u64,
}

/// Lazily rebuilt, type-keyed table of factories.
///
/// The table always reflects exactly the live subscriber set: every
/// subscription change marks it dirty, and the next lookup clears it and
/// replays all initializers. The dirty check, the replay and the swap-in
/// of the new table happen under one lock. A rebuild that hits a
/// collision leaves the registry dirty, so every lookup keeps reporting
/// the error until the offending subscription is removed.
pub struct CreatorRegistry {
    inner: Mutex<Inner>,
}

impl CreatorRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                subscribers: Vec::new(),
                next_id: 1,
                dirty: false,
                table: Arc::new(CreatorTable::default()),
                rebuilds: 0,
            }),
        }
    }

    // ---------------------------------------------------------------
    // Subscriptions
    // ---------------------------------------------------------------

    /// Add an initializer. Marks the table dirty.
    pub fn subscribe(&self, initializer: impl CreatorInitializer + 'static) -> SubscriptionId {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(initializer)));
        inner.dirty = true;
        debug!(subscription = id.0, "creator initializer subscribed");
        id
    }

    /// Remove an initializer. Marks the table dirty if it was present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        let removed = inner.subscribers.len() != before;
        if removed {
            inner.dirty = true;
            debug!(subscription = id.0, "creator initializer unsubscribed");
        }
        removed
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// The current table, rebuilding first if dirty.
    pub fn table(&self) -> CreatorResult<Arc<CreatorTable>> {
        let mut inner = self.inner.lock();
        if inner.dirty {
            let mut builder = CreatorTableBuilder::default();
            for (_, initializer) in &inner.subscribers {
                initializer.register(&mut builder);
            }
            inner.rebuilds += 1;
            let table = builder.finish().map_err(|e| {
                warn!(error = %e, "creator table rebuild failed");
                e
            })?;
            debug!(
                creators = table.len(),
                subscribers = inner.subscribers.len(),
                "rebuilt creator table"
            );
            inner.table = Arc::new(table);
            inner.dirty = false;
        }
        Ok(Arc::clone(&inner.table))
    }

    /// Look up a factory by type id.
    pub fn lookup_id(&self, id: Uuid) -> CreatorResult<Option<Arc<CreatorEntry>>> {
        Ok(self.table()?.get_by_id(id))
    }

    /// Look up a factory by type name.
    pub fn lookup_name(&self, name: &str) -> CreatorResult<Option<Arc<CreatorEntry>>> {
        Ok(self.table()?.get_by_name(name))
    }

    /// Look up a factory for a descriptor (by its id).
    pub fn lookup(&self, type_desc: &TypeDescriptor) -> CreatorResult<Option<Arc<CreatorEntry>>> {
        self.lookup_id(type_desc.id())
    }

    /// Number of registered factories.
    pub fn count(&self) -> CreatorResult<usize> {
        Ok(self.table()?.len())
    }

    /// Registered types sorted by name.
    pub fn types(&self) -> CreatorResult<Vec<TypeDescriptor>> {
        Ok(self.table()?.types())
    }

    /// How many rebuild passes have run.
    pub fn rebuild_count(&self) -> u64 {
        self.inner.lock().rebuilds
    }
}

impl Default for CreatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CreatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CreatorRegistry")
            .field("subscribers", &inner.subscribers.len())
            .field("dirty", &inner.dirty)
            .field("creators", &inner.table.len())
            .finish()
    }
}
