use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use objreg_creators::CreatorRegistry;
use objreg_persist::{
    BatchReport, JsonLinesReader, JsonLinesWriter, LoadOutcome, LoadSelector, ObjectReader,
    ObjectWriter, PersistenceCoordinator, SaveOptions,
};
use objreg_store::{ListenerId, ObjectRecord, ObjectRegistry, RegistryListener};
use objreg_types::{Recipe, TypeDescriptor};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::{DefaultEntry, WorkspaceConfig};
use crate::error::{SdkError, SdkResult};
use crate::kinds::{BuiltinKinds, BuiltinTypes};

/// A configured object registry with its creators.
pub struct Workspace {
    objects: Arc<ObjectRegistry>,
    creators: Arc<CreatorRegistry>,
    config: WorkspaceConfig,
    types: BuiltinTypes,
    buffer_releases: Arc<AtomicUsize>,
    /// Serializes load and save batches. Not the registry's write lock.
    batch: Mutex<()>,
    reseeder: Option<ListenerId>,
}

impl Workspace {
    /// Build a workspace and create its default entries.
    pub fn new(config: WorkspaceConfig) -> SdkResult<Self> {
        config.validate()?;

        let objects = Arc::new(ObjectRegistry::new());
        let creators = Arc::new(CreatorRegistry::new());
        let types = BuiltinTypes::new()?;
        let buffer_releases = Arc::new(AtomicUsize::new(0));

        if config.include_builtin_creators {
            creators.subscribe(BuiltinKinds::new(types.clone(), Arc::clone(&buffer_releases)));
        }

        let mut ws = Self {
            objects,
            creators,
            config,
            types,
            buffer_releases,
            batch: Mutex::new(()),
            reseeder: None,
        };
        ws.seed()?;

        if ws.config.reseed_defaults && !ws.config.defaults.is_empty() {
            let listener = Arc::new(DefaultReseeder {
                creators: Arc::clone(&ws.creators),
                defaults: ws.config.defaults.clone(),
            });
            ws.reseeder = Some(ws.objects.subscribe(listener));
        }

        info!(
            defaults = ws.config.defaults.len(),
            builtins = ws.config.include_builtin_creators,
            "workspace ready"
        );
        Ok(ws)
    }

    /// Load a [`WorkspaceConfig`] from a TOML file and build on it.
    pub fn from_config_file(path: &Path) -> SdkResult<Self> {
        Self::new(WorkspaceConfig::load(path)?)
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn creators(&self) -> &CreatorRegistry {
        &self.creators
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn builtin_types(&self) -> &BuiltinTypes {
        &self.types
    }

    /// How many built-in buffers have been released so far.
    pub fn buffer_releases(&self) -> usize {
        self.buffer_releases.load(Ordering::SeqCst)
    }

    /// Build an object of `kind` (a creator type name) and store it.
    pub fn create(&self, kind: &str, name: &str, recipe: &Recipe) -> SdkResult<Vec<Arc<ObjectRecord>>> {
        create_named(&self.objects, &self.creators, kind, name, recipe)
    }

    /// Remove every object. Default entries come back if reseeding is on.
    pub fn clear(&self) {
        self.objects.clear();
    }

    fn seed(&self) -> SdkResult<()> {
        for entry in &self.config.defaults {
            create_default(&self.objects, &self.creators, entry)?;
        }
        Ok(())
    }

    fn coordinator(&self) -> PersistenceCoordinator<'_> {
        PersistenceCoordinator::new(&self.objects, &self.creators).with_options(SaveOptions {
            include_dependencies: self.config.save_dependencies,
        })
    }

    // ---- Persistence ----

    /// Load items from `reader` into the registry.
    ///
    /// Loads and saves on this workspace are serialized by a batch lock
    /// separate from the registry's write lock. Inserts and removes from
    /// other threads can interleave with a load; each is still atomic, and a
    /// later insert of the same name replaces the loaded record.
    pub fn load(&self, reader: &dyn ObjectReader, selector: &LoadSelector) -> LoadOutcome {
        let _batch = self.batch.lock();
        self.coordinator().load(reader, selector)
    }

    /// Write records to `writer`, dependencies first.
    ///
    /// Shares the batch lock with [`Self::load`]. A record replaced by
    /// another thread mid-save is reported by the stale-record check
    /// instead of being silently mixed into the output.
    pub fn save(&self, writer: &mut dyn ObjectWriter, names: Option<&[String]>) -> BatchReport {
        let _batch = self.batch.lock();
        self.coordinator().save(writer, names)
    }

    pub fn list(&self, reader: &dyn ObjectReader) -> SdkResult<Vec<(TypeDescriptor, String)>> {
        Ok(self.coordinator().list(reader)?)
    }

    /// Load from a JSON-lines file.
    pub fn load_file(&self, path: &Path, selector: &LoadSelector) -> SdkResult<LoadOutcome> {
        let reader = JsonLinesReader::open(path)?;
        Ok(self.load(&reader, selector))
    }

    /// Save to a JSON-lines file, replacing it.
    pub fn save_file(&self, path: &Path, names: Option<&[String]>) -> SdkResult<BatchReport> {
        let mut writer: JsonLinesWriter<BufWriter<File>> = JsonLinesWriter::create(path)?;
        let report = self.save(&mut writer, names);
        writer.finish()?;
        Ok(report)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(id) = self.reseeder.take() {
            self.objects.unsubscribe(id);
        }
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("objects", &self.objects.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn create_named(
    objects: &ObjectRegistry,
    creators: &CreatorRegistry,
    kind: &str,
    name: &str,
    recipe: &Recipe,
) -> SdkResult<Vec<Arc<ObjectRecord>>> {
    let entry = creators
        .lookup_name(kind)?
        .ok_or_else(|| SdkError::UnknownKind(kind.to_string()))?;
    let records = entry
        .create(name, recipe, objects)
        .map_err(|source| SdkError::Create {
            name: name.to_string(),
            source,
        })?;
    for record in &records {
        if !objects.add(Arc::clone(record)).is_stored() {
            return Err(SdkError::Rejected(record.name().to_string()));
        }
    }
    Ok(records)
}

fn create_default(
    objects: &ObjectRegistry,
    creators: &CreatorRegistry,
    entry: &DefaultEntry,
) -> SdkResult<()> {
    create_named(objects, creators, &entry.kind, &entry.name, &entry.recipe)?;
    Ok(())
}

/// Recreates default entries after the registry is cleared.
struct DefaultReseeder {
    creators: Arc<CreatorRegistry>,
    defaults: Vec<DefaultEntry>,
}

impl RegistryListener for DefaultReseeder {
    fn after_clear(&self, registry: &ObjectRegistry) {
        for entry in &self.defaults {
            if let Err(e) = create_default(registry, &self.creators, entry) {
                warn!(name = %entry.name, error = %e, "failed to reseed default");
            }
        }
    }
}
