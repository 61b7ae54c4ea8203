//! Bulk load and save over an object registry.
//!
//! Both operations run to completion on the calling thread and go through
//! `Idle → Running → Completed`; the returned [`BatchReport`] is the
//! completed state. Per-item failures are recorded, never raised.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use objreg_creators::CreatorRegistry;
use objreg_store::{ObjectRecord, ObjectRegistry};
use objreg_types::TypeDescriptor;
use tracing::{debug, info, info_span};

use crate::error::PersistResult;
use crate::report::{BatchReport, Operation, ReportKind};
use crate::stream::{LoadSelector, ObjectReader, ObjectWriter, StreamItem};

/// Result of [`PersistenceCoordinator::load`].
#[derive(Debug)]
pub struct LoadOutcome {
    /// Records that were inserted, in insertion order.
    pub inserted: Vec<Arc<ObjectRecord>>,
    pub report: BatchReport,
}

/// Tuning for [`PersistenceCoordinator::save`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveOptions {
    /// Walk and write dependencies before each record. When `false` only
    /// the starting records are written.
    pub include_dependencies: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            include_dependencies: true,
        }
    }
}

/// Stateless glue between a registry, its creators and a stream.
///
/// The coordinator holds no lock of its own. Callers that run loads or
/// saves from several threads should serialize them.
pub struct PersistenceCoordinator<'a> {
    objects: &'a ObjectRegistry,
    creators: &'a CreatorRegistry,
    options: SaveOptions,
}

impl<'a> PersistenceCoordinator<'a> {
    pub fn new(objects: &'a ObjectRegistry, creators: &'a CreatorRegistry) -> Self {
        Self {
            objects,
            creators,
            options: SaveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SaveOptions) -> Self {
        self.options = options;
        self
    }

    /// `(type, name)` pairs available from `reader`, without creating
    /// anything.
    pub fn list(&self, reader: &dyn ObjectReader) -> PersistResult<Vec<(TypeDescriptor, String)>> {
        reader.names()
    }

    // ---------------------------------------------------------------
    // Load
    // ---------------------------------------------------------------

    /// Rebuild the selected items from `reader` and insert them.
    pub fn load(&self, reader: &dyn ObjectReader, selector: &LoadSelector) -> LoadOutcome {
        let _span = info_span!("load").entered();
        let mut report = BatchReport::new(Operation::Load);
        let mut inserted = Vec::new();

        let items = match reader.select(selector) {
            Ok(items) => items,
            Err(e) => {
                report.error(ReportKind::Io, None, format!("reading stream failed: {e}"));
                return LoadOutcome { inserted, report };
            }
        };
        info!(items = items.len(), "loading objects");

        for item in items {
            self.load_item(item, &mut inserted, &mut report);
        }

        info!(
            inserted = report.success_count,
            errors = report.error_count(),
            "load complete"
        );
        LoadOutcome { inserted, report }
    }

    fn load_item(
        &self,
        item: StreamItem,
        inserted: &mut Vec<Arc<ObjectRecord>>,
        report: &mut BatchReport,
    ) {
        let name = item.name.as_str();
        let Some(type_desc) = item.type_desc else {
            report.error(ReportKind::Validation, Some(name), "no data found in stream");
            return;
        };

        let entry = match self.creators.lookup(&type_desc) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                report.error(
                    ReportKind::NotFound,
                    Some(name),
                    format!("no creator registered for type {type_desc}"),
                );
                return;
            }
            Err(e) => {
                report.error(ReportKind::Consistency, Some(name), e.to_string());
                return;
            }
        };

        let recipe = item.recipe.unwrap_or_default();
        let records = match entry.create(name, &recipe, self.objects) {
            Ok(records) => records,
            Err(e) => {
                report.error(ReportKind::Factory, Some(name), e.to_string());
                return;
            }
        };

        for record in records {
            let outcome = self.objects.add(Arc::clone(&record));
            if outcome.is_stored() {
                debug!(name = record.name(), %outcome, "loaded object");
                report.success_count += 1;
                inserted.push(record);
            } else {
                report.error(
                    ReportKind::Rejected,
                    Some(record.name()),
                    "registry rejected the created object",
                );
            }
        }
    }

    // ---------------------------------------------------------------
    // Save
    // ---------------------------------------------------------------

    /// Write records to `writer`, dependencies first, each exactly once.
    ///
    /// With `names = None` every record in the registry is a starting
    /// point; otherwise only the named ones (missing names are reported).
    pub fn save(&self, writer: &mut dyn ObjectWriter, names: Option<&[String]>) -> BatchReport {
        let _span = info_span!("save").entered();
        let mut walk = SaveWalk {
            objects: self.objects,
            writer,
            include_dependencies: self.options.include_dependencies,
            visited: HashMap::new(),
            on_path: HashSet::new(),
            report: BatchReport::new(Operation::Save),
        };

        let roots: Vec<Arc<ObjectRecord>> = match names {
            None => self.objects.items(),
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let found = self.objects.get_record(name);
                    if found.is_none() {
                        walk.report
                            .error(ReportKind::NotFound, Some(name.as_str()), "object not found");
                    }
                    found
                })
                .collect(),
        };
        info!(roots = roots.len(), "saving objects");

        for record in &roots {
            walk.visit(record);
        }

        let report = walk.report;
        info!(
            stored = report.success_count,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "save complete"
        );
        report
    }
}

/// Traversal state for one save call.
struct SaveWalk<'w> {
    objects: &'w ObjectRegistry,
    writer: &'w mut dyn ObjectWriter,
    include_dependencies: bool,
    /// Names already handled in this save, with the record that was used.
    visited: HashMap<String, Arc<ObjectRecord>>,
    /// Names on the current depth-first path.
    on_path: HashSet<String>,
    report: BatchReport,
}

impl SaveWalk<'_> {
    fn visit(&mut self, record: &Arc<ObjectRecord>) {
        let name = record.name();

        if let Some(seen) = self.visited.get(name) {
            if Arc::ptr_eq(seen, record) {
                return;
            }
        }

        if !self.on_path.insert(name.to_string()) {
            self.report.error(
                ReportKind::Consistency,
                Some(name),
                "dependency cycle: object depends on a record with its own name",
            );
            return;
        }
        if self.include_dependencies {
            for dep in record.dependencies() {
                self.visit(dep);
            }
        }
        self.on_path.remove(name);

        if let Some(seen) = self.visited.get(name) {
            if !Arc::ptr_eq(seen, record) {
                self.report.warning(
                    ReportKind::Consistency,
                    Some(name),
                    "another object with this name was already written",
                );
            }
            return;
        }

        let live = self.objects.get_record(name);
        if !live.is_some_and(|live| Arc::ptr_eq(&live, record)) {
            self.report.error(
                ReportKind::Consistency,
                Some(name),
                "record differs from the one currently in the registry",
            );
        }

        match self.writer.write_object(record) {
            Ok(()) => {
                debug!(name, "wrote object");
                self.report.success_count += 1;
            }
            Err(e) => {
                self.report
                    .error(ReportKind::Io, Some(name), format!("write failed: {e}"));
            }
        }
        self.visited.insert(name.to_string(), Arc::clone(record));
    }
}
