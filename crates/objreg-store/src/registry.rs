use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use objreg_types::{validate_object_name, TypeDescriptor};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::events::{InsertOutcome, ListenerId, RegistryListener};
use crate::record::ObjectRecord;
use crate::value::{downcast_value, StoredValue};

type Entries = IndexMap<String, Arc<ObjectRecord>>;

/// The central name → record store.
///
/// Entries are kept in insertion order; replacing a record keeps its slot.
/// Readers load the current map through an [`ArcSwap`] and never wait on a
/// writer. Writers (`insert`, `remove`, `clear`) take one mutex, clone the
/// map, apply the change, swap it in and release displaced values before
/// letting go of the mutex.
///
/// A registry is built once at startup and handed to whoever needs it; there
/// is no global instance.
pub struct ObjectRegistry {
    entries: ArcSwap<Entries>,
    write_lock: Mutex<()>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn RegistryListener>)>>,
    next_listener: AtomicU64,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Entries::new()),
            write_lock: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Store a record under its name.
    ///
    /// Returns [`InsertOutcome::Rejected`] if `record` is `None`, has an
    /// invalid name, or has already been released. If a different record is
    /// stored under the same name it is released and overwritten. Inserting
    /// the record that is already stored is a no-op reported as `Replaced`.
    pub fn insert(&self, record: Option<Arc<ObjectRecord>>) -> InsertOutcome {
        let Some(record) = record else {
            warn!("rejected insert of absent record");
            self.notify(|l| l.item_added(None, InsertOutcome::Rejected));
            return InsertOutcome::Rejected;
        };

        if let Err(e) = validate_object_name(record.name()) {
            warn!(error = %e, "rejected insert");
            self.notify(|l| l.item_added(Some(&record), InsertOutcome::Rejected));
            return InsertOutcome::Rejected;
        }

        let outcome = {
            let _guard = self.write_lock.lock();
            // Checked under the lock: a concurrent replace may release it.
            if record.is_released() {
                None
            } else {
                Some(self.store_locked(&record))
            }
        };
        let Some(outcome) = outcome else {
            warn!(name = record.name(), "rejected insert of released record");
            self.notify(|l| l.item_added(Some(&record), InsertOutcome::Rejected));
            return InsertOutcome::Rejected;
        };

        debug!(name = record.name(), kind = %record.type_desc(), %outcome, "stored object");
        self.notify(|l| l.item_added(Some(&record), outcome));
        outcome
    }

    /// Swap in a map holding `record`. Caller holds `write_lock`.
    fn store_locked(&self, record: &Arc<ObjectRecord>) -> InsertOutcome {
        let mut next = Entries::clone(&self.entries.load());
        let previous = next.insert(record.name().to_string(), Arc::clone(record));
        self.entries.store(Arc::new(next));

        match previous {
            None => InsertOutcome::Added,
            Some(prev) if Arc::ptr_eq(&prev, record) => InsertOutcome::Replaced,
            Some(prev) => {
                prev.release();
                InsertOutcome::Replaced
            }
        }
    }

    /// Store a record that is known to be present. See [`Self::insert`].
    pub fn add(&self, record: Arc<ObjectRecord>) -> InsertOutcome {
        self.insert(Some(record))
    }

    /// Remove a record by name, releasing its value.
    ///
    /// Returns `true` if an entry existed.
    pub fn remove(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        let removed = {
            let _guard = self.write_lock.lock();
            let current = self.entries.load_full();
            if !current.contains_key(name) {
                return false;
            }
            let mut next = Entries::clone(&current);
            let removed = next.shift_remove(name);
            self.entries.store(Arc::new(next));
            if let Some(rec) = &removed {
                rec.release();
            }
            removed
        };

        if removed.is_some() {
            debug!(name, "removed object");
            self.notify(|l| l.item_removed(name));
        }
        removed.is_some()
    }

    /// Remove every record, releasing each value exactly once.
    ///
    /// Fires [`RegistryListener::after_clear`] once, after the lock is
    /// released, so listeners can reseed default entries.
    pub fn clear(&self) {
        let released = {
            let _guard = self.write_lock.lock();
            let previous = self.entries.swap(Arc::new(Entries::new()));
            let mut released = 0usize;
            for rec in previous.values() {
                if rec.release() {
                    released += 1;
                }
            }
            released
        };

        debug!(released, "cleared registry");
        self.notify(|l| l.after_clear(self));
    }

    // ---------------------------------------------------------------
    // Queries (snapshot reads)
    // ---------------------------------------------------------------

    /// The value stored under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn StoredValue>> {
        self.entries
            .load()
            .get(name)
            .map(|rec| Arc::clone(rec.value()))
    }

    /// The value stored under `name` as `T`, unwrapping one result
    /// container level if needed.
    pub fn get_as<T: StoredValue>(&self, name: &str) -> Option<Arc<T>> {
        let value = self.get(name)?;
        downcast_value(&value)
    }

    /// The full record stored under `name`.
    pub fn get_record(&self, name: &str) -> Option<Arc<ObjectRecord>> {
        self.entries.load().get(name).cloned()
    }

    /// Like [`Self::get_record`] but with a `NotFound` error.
    pub fn require(&self, name: &str) -> StoreResult<Arc<ObjectRecord>> {
        self.get_record(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.load().contains_key(name)
    }

    /// All records, in insertion order.
    pub fn items(&self) -> Vec<Arc<ObjectRecord>> {
        self.entries.load().values().cloned().collect()
    }

    /// All records of the given type, in insertion order.
    pub fn by_type(&self, type_desc: &TypeDescriptor) -> Vec<Arc<ObjectRecord>> {
        self.entries
            .load()
            .values()
            .filter(|rec| rec.type_desc() == type_desc)
            .cloned()
            .collect()
    }

    /// All names, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.load().keys().cloned().collect()
    }

    /// Records that list `name` among their direct dependencies.
    pub fn dependents_of(&self, name: &str) -> Vec<Arc<ObjectRecord>> {
        self.entries
            .load()
            .values()
            .filter(|rec| rec.dependencies().iter().any(|dep| dep.name() == name))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    // ---------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------

    /// Register a listener for change notifications.
    pub fn subscribe(&self, listener: Arc<dyn RegistryListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Drop a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn notify(&self, f: impl Fn(&dyn RegistryListener)) {
        let listeners: Vec<Arc<dyn RegistryListener>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("object_count", &self.len())
            .field("listener_count", &self.listeners.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use objreg_types::Recipe;

    use super::*;
    use crate::value::{Releasable, ResultContainer};

    struct Number(f64);
    impl StoredValue for Number {}

    struct Buffer(Arc<AtomicUsize>);
    impl StoredValue for Buffer {
        fn as_releasable(&self) -> Option<&dyn Releasable> {
            Some(self)
        }
    }
    impl Releasable for Buffer {
        fn release(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Computed(Arc<dyn StoredValue>);
    impl StoredValue for Computed {
        fn as_result(&self) -> Option<&dyn ResultContainer> {
            Some(self)
        }
    }
    impl ResultContainer for Computed {
        fn inner(&self) -> Arc<dyn StoredValue> {
            Arc::clone(&self.0)
        }
    }

    fn number_type() -> TypeDescriptor {
        TypeDescriptor::derived("number").unwrap()
    }

    fn buffer_type() -> TypeDescriptor {
        TypeDescriptor::derived("buffer").unwrap()
    }

    fn number(name: &str, v: f64) -> Arc<ObjectRecord> {
        ObjectRecord::standalone(name, number_type(), Arc::new(Number(v))).unwrap()
    }

    fn buffer(name: &str, counter: &Arc<AtomicUsize>) -> Arc<ObjectRecord> {
        ObjectRecord::standalone(name, buffer_type(), Arc::new(Buffer(Arc::clone(counter))))
            .unwrap()
    }

    /// Records every notification as a string.
    #[derive(Default)]
    struct EventLog(parking_lot::Mutex<Vec<String>>);

    impl EventLog {
        fn events(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    impl RegistryListener for EventLog {
        fn item_added(&self, record: Option<&Arc<ObjectRecord>>, outcome: InsertOutcome) {
            let name = record.map_or("<none>", |r| r.name());
            self.0.lock().push(format!("added:{name}:{outcome}"));
        }

        fn item_removed(&self, name: &str) {
            self.0.lock().push(format!("removed:{name}"));
        }

        fn after_clear(&self, _registry: &ObjectRegistry) {
            self.0.lock().push("cleared".into());
        }
    }

    // -----------------------------------------------------------------------
    // Insert
    // -----------------------------------------------------------------------

    #[test]
    fn insert_new_name_is_added() {
        let reg = ObjectRegistry::new();
        let rec = number("x", 1.5);
        assert_eq!(reg.insert(Some(Arc::clone(&rec))), InsertOutcome::Added);
        assert_eq!(reg.len(), 1);

        let value = reg.get("x").unwrap();
        assert!(Arc::ptr_eq(&value, rec.value()));
        assert_eq!(reg.get_as::<Number>("x").unwrap().0, 1.5);
    }

    #[test]
    fn replace_releases_previous_value_once() {
        let reg = ObjectRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let first = buffer("buf", &counter);
        reg.add(Arc::clone(&first));

        let second = buffer("buf", &counter);
        assert_eq!(reg.add(Arc::clone(&second)), InsertOutcome::Replaced);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(first.is_released());
        assert!(!second.is_released());
        assert_eq!(reg.len(), 1);
        assert!(reg.get_record("buf").unwrap().same_as(&second));
    }

    #[test]
    fn replace_keeps_insertion_slot() {
        let reg = ObjectRegistry::new();
        reg.add(number("a", 1.0));
        reg.add(number("b", 2.0));
        reg.add(number("a", 3.0));
        assert_eq!(reg.names(), ["a", "b"]);
        assert_eq!(reg.get_as::<Number>("a").unwrap().0, 3.0);
    }

    #[test]
    fn reinserting_same_record_does_not_release() {
        let reg = ObjectRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let rec = buffer("buf", &counter);
        reg.add(Arc::clone(&rec));
        assert_eq!(reg.add(Arc::clone(&rec)), InsertOutcome::Replaced);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(!rec.is_released());
    }

    #[test]
    fn insert_none_is_rejected_and_notified() {
        let reg = ObjectRegistry::new();
        let log = Arc::new(EventLog::default());
        reg.subscribe(log.clone());

        assert_eq!(reg.insert(None), InsertOutcome::Rejected);
        assert_eq!(reg.len(), 0);
        assert_eq!(log.events(), ["added:<none>:rejected"]);
    }

    #[test]
    fn insert_released_record_is_rejected() {
        let reg = ObjectRegistry::new();
        let rec = number("gone", 0.0);
        rec.release();
        assert_eq!(reg.add(rec), InsertOutcome::Rejected);
        assert!(reg.is_empty());
    }

    #[test]
    fn reinserting_a_displaced_record_is_rejected() {
        let reg = ObjectRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let old = buffer("slot", &counter);
        reg.add(Arc::clone(&old));
        let new = buffer("slot", &counter);
        reg.add(Arc::clone(&new));
        assert!(old.is_released());

        assert_eq!(reg.add(old), InsertOutcome::Rejected);
        assert!(reg.get_record("slot").unwrap().same_as(&new));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    // -----------------------------------------------------------------------
    // Remove / Clear
    // -----------------------------------------------------------------------

    #[test]
    fn remove_existing_releases() {
        let reg = ObjectRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        reg.add(buffer("buf", &counter));

        assert!(reg.remove("buf"));
        assert!(!reg.contains("buf"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!reg.remove("buf"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_missing_or_empty_name() {
        let reg = ObjectRegistry::new();
        assert!(!reg.remove("nope"));
        assert!(!reg.remove(""));
    }

    #[test]
    fn remove_preserves_order_of_rest() {
        let reg = ObjectRegistry::new();
        for n in ["a", "b", "c"] {
            reg.add(number(n, 0.0));
        }
        reg.remove("b");
        assert_eq!(reg.names(), ["a", "c"]);
    }

    #[test]
    fn clear_releases_everything_and_notifies_once() {
        let reg = ObjectRegistry::new();
        let log = Arc::new(EventLog::default());
        let counter = Arc::new(AtomicUsize::new(0));
        reg.add(buffer("b1", &counter));
        reg.add(buffer("b2", &counter));
        reg.add(number("n", 1.0));
        reg.subscribe(log.clone());

        reg.clear();

        assert_eq!(reg.len(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(log.events(), ["cleared"]);
    }

    #[test]
    fn after_clear_listener_can_reseed() {
        struct Reseed;
        impl RegistryListener for Reseed {
            fn after_clear(&self, registry: &ObjectRegistry) {
                registry.add(number("default", 0.0));
            }
        }

        let reg = ObjectRegistry::new();
        reg.subscribe(Arc::new(Reseed));
        reg.add(number("temp", 1.0));
        reg.clear();
        assert_eq!(reg.names(), ["default"]);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[test]
    fn by_type_filters() {
        let reg = ObjectRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        reg.add(number("n1", 1.0));
        reg.add(buffer("b1", &counter));
        reg.add(number("n2", 2.0));

        let names: Vec<String> = reg
            .by_type(&number_type())
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, ["n1", "n2"]);
        assert_eq!(reg.by_type(&buffer_type()).len(), 1);
    }

    #[test]
    fn get_as_unwraps_result_container() {
        let reg = ObjectRegistry::new();
        let rec = ObjectRecord::standalone(
            "wrapped",
            number_type(),
            Arc::new(Computed(Arc::new(Number(9.0)))),
        )
        .unwrap();
        reg.add(rec);

        assert_eq!(reg.get_as::<Number>("wrapped").unwrap().0, 9.0);
        assert!(reg.get_as::<Buffer>("wrapped").is_none());
        assert!(reg.get_as::<Number>("missing").is_none());
    }

    #[test]
    fn require_reports_not_found() {
        let reg = ObjectRegistry::new();
        assert_eq!(
            reg.require("x").unwrap_err(),
            StoreError::NotFound("x".into())
        );
    }

    #[test]
    fn dependents_of_direct_only() {
        let reg = ObjectRegistry::new();
        let base = number("base", 1.0);
        let mid = ObjectRecord::new(
            "mid",
            number_type(),
            Arc::new(Number(2.0)),
            Recipe::new(),
            vec![Arc::clone(&base)],
        )
        .unwrap();
        let top = ObjectRecord::new(
            "top",
            number_type(),
            Arc::new(Number(3.0)),
            Recipe::new(),
            vec![Arc::clone(&mid)],
        )
        .unwrap();
        reg.add(base);
        reg.add(mid);
        reg.add(top);

        let deps: Vec<String> = reg
            .dependents_of("base")
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(deps, ["mid"]);
    }

    #[test]
    fn snapshots_are_unaffected_by_later_writes() {
        let reg = ObjectRegistry::new();
        reg.add(number("a", 1.0));
        let items = reg.items();
        reg.add(number("b", 2.0));
        reg.remove("a");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "a");
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    #[test]
    fn listener_sees_add_replace_remove() {
        let reg = ObjectRegistry::new();
        let log = Arc::new(EventLog::default());
        let id = reg.subscribe(log.clone());

        reg.add(number("x", 1.0));
        reg.add(number("x", 2.0));
        reg.remove("x");
        assert_eq!(
            log.events(),
            ["added:x:added", "added:x:replaced", "removed:x"]
        );

        assert!(reg.unsubscribe(id));
        assert!(!reg.unsubscribe(id));
        reg.add(number("y", 1.0));
        assert_eq!(log.events().len(), 3);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_writers_and_readers() {
        let reg = Arc::new(ObjectRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let reg = Arc::clone(&reg);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for i in 0..50 {
                        reg.add(buffer(&format!("obj-{}", i % 10), &counter));
                        if i % 7 == t {
                            reg.remove(&format!("obj-{}", i % 10));
                        }
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for _ in 0..200 {
                        for rec in reg.items() {
                            assert!(!rec.name().is_empty());
                        }
                        let _ = reg.get("obj-1");
                    }
                })
            })
            .collect();

        for h in writers.into_iter().chain(readers) {
            h.join().expect("thread should not panic");
        }

        // Every buffer ever displaced was released exactly once; the ones
        // still stored are not released.
        let live = reg.len();
        assert_eq!(counter.load(Ordering::SeqCst), 4 * 50 - live);
        assert!(reg.items().iter().all(|r| !r.is_released()));
    }

    #[test]
    fn racing_reinsert_never_stores_a_released_record() {
        let reg = Arc::new(ObjectRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let shared = buffer("x", &counter);
            reg.add(Arc::clone(&shared));

            let reinserter = {
                let reg = Arc::clone(&reg);
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..50 {
                        reg.add(Arc::clone(&shared));
                    }
                })
            };
            let replacer = {
                let reg = Arc::clone(&reg);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..50 {
                        reg.add(buffer("x", &counter));
                    }
                })
            };
            reinserter.join().expect("thread should not panic");
            replacer.join().expect("thread should not panic");

            assert!(!reg.get_record("x").unwrap().is_released());
        }
    }

    #[test]
    fn debug_format() {
        let reg = ObjectRegistry::new();
        reg.add(number("x", 1.0));
        let debug = format!("{reg:?}");
        assert!(debug.contains("ObjectRegistry"));
        assert!(debug.contains("object_count: 1"));
    }
}
