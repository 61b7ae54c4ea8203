//! Bulk persistence for objreg registries.
//!
//! The [`PersistenceCoordinator`] moves records between an
//! [`ObjectRegistry`](objreg_store::ObjectRegistry) and an external stream.
//! It never fixes a format: streams are reached through the
//! [`ObjectReader`] and [`ObjectWriter`] traits.
//!
//! # Architecture
//!
//! - **Load**: reader items → creator lookup → factory → registry insert.
//! - **Save**: registry records → dependency-first walk → writer, each
//!   record exactly once.
//! - Both are best-effort batches: per-item failures land in a
//!   [`BatchReport`] and never stop the batch.
//!
//! # Stream adapters
//!
//! - [`JsonLinesReader`] / [`JsonLinesWriter`] — one JSON object per line
//! - [`InMemoryStream`] — reader and writer over a `Vec`, for tests and
//!   in-process copies

pub mod coordinator;
pub mod error;
pub mod jsonl;
pub mod memory;
pub mod report;
pub mod stream;

pub use coordinator::{LoadOutcome, PersistenceCoordinator, SaveOptions};
pub use error::{PersistError, PersistResult};
pub use jsonl::{JsonLinesReader, JsonLinesWriter};
pub use memory::InMemoryStream;
pub use report::{BatchReport, Operation, ReportEntry, ReportKind, Severity};
pub use stream::{LoadSelector, ObjectReader, ObjectWriter, StreamEntry, StreamItem};
