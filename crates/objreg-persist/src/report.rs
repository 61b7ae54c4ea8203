use std::fmt;

use tracing::warn;

/// Which batch produced a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Load,
    Save,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Save => "save",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Classification of a report entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    /// Bad input shape (e.g. missing data for a name).
    Validation,
    /// A creator, dependency or requested name could not be found.
    NotFound,
    /// Duplicate registrations, identity collisions, stale snapshots, cycles.
    Consistency,
    /// The factory returned an error.
    Factory,
    /// The registry refused a produced record.
    Rejected,
    /// The reader or writer failed.
    Io,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::NotFound => "not found",
            Self::Consistency => "consistency",
            Self::Factory => "factory",
            Self::Rejected => "rejected",
            Self::Io => "i/o",
        })
    }
}

/// One itemized message in a [`BatchReport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    pub severity: Severity,
    pub kind: ReportKind,
    /// The object the message is about, if any.
    pub name: Option<String>,
    pub message: String,
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.name {
            Some(name) => write!(f, "{level} [{}] {name}: {}", self.kind, self.message),
            None => write!(f, "{level} [{}] {}", self.kind, self.message),
        }
    }
}

/// Aggregated result of a load or save.
///
/// A batch succeeds when it recorded no errors; warnings do not count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub operation: Operation,
    /// Records inserted (load) or written (save).
    pub success_count: usize,
    pub entries: Vec<ReportEntry>,
}

impl BatchReport {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            success_count: 0,
            entries: Vec::new(),
        }
    }

    pub fn error(&mut self, kind: ReportKind, name: Option<&str>, message: impl Into<String>) {
        self.push(Severity::Error, kind, name, message.into());
    }

    pub fn warning(&mut self, kind: ReportKind, name: Option<&str>, message: impl Into<String>) {
        self.push(Severity::Warning, kind, name, message.into());
    }

    fn push(&mut self, severity: Severity, kind: ReportKind, name: Option<&str>, message: String) {
        warn!(
            operation = %self.operation,
            ?severity,
            %kind,
            name = name.unwrap_or("-"),
            "{message}"
        );
        self.entries.push(ReportEntry {
            severity,
            kind,
            name: name.map(str::to_string),
            message,
        });
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} succeeded, {} failed, {} warnings",
            self.operation,
            self.success_count,
            self.error_count(),
            self.warning_count()
        )?;
        for entry in &self.entries {
            write!(f, "\n  {entry}")?;
        }
        Ok(())
    }
}
