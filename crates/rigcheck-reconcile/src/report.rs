//! Validation and repair report types

use rigcheck_core::Status;
use std::fmt;

/// Which check produced a finding or action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    SourceExists,
    DefaultValue,
    Connection,
}

impl CheckKind {
    pub fn label(self) -> &'static str {
        match self {
            CheckKind::SourceExists => "source",
            CheckKind::DefaultValue => "default",
            CheckKind::Connection => "connection",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one check in a validate pass
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Long name of the owning source node
    pub source: String,
    /// Long name of the checked node
    pub node: String,
    pub kind: CheckKind,
    pub status: Status,
    pub detail: Option<String>,
}

/// A complete validation report
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub validator: String,
    pub status: Status,
    pub findings: Vec<Finding>,
    pub sources_checked: usize,
    /// The pass stopped early at a source node boundary
    pub cancelled: bool,
}

impl ValidationReport {
    /// Create an empty report
    pub fn new(validator: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            ..Self::default()
        }
    }

    /// True when nothing failed and the pass ran to completion
    pub fn is_valid(&self) -> bool {
        !self.cancelled && !self.status.is_failing()
    }

    pub fn count(&self, status: Status) -> usize {
        self.findings.iter().filter(|f| f.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.status.is_failing())
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{}: {} ({} check(s): {} passed, {} failed, {} missing source, {} missing destination)",
            self.validator,
            self.status,
            self.findings.len(),
            self.count(Status::Passed),
            self.count(Status::Failed),
            self.count(Status::MissingSource),
            self.count(Status::MissingDestination),
        );
        if self.cancelled {
            summary.push_str(" [cancelled]");
        }
        summary
    }
}

/// A write that a repair pass applied
#[derive(Debug, Clone, PartialEq)]
pub struct RepairAction {
    pub source: String,
    pub node: String,
    pub kind: CheckKind,
    pub description: String,
}

/// A repair that could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct RepairError {
    pub source: String,
    pub node: String,
    pub kind: CheckKind,
    pub message: String,
}

/// Report of a repair pass
#[derive(Debug, Default)]
pub struct RepairReport {
    pub validator: String,
    pub actions: Vec<RepairAction>,
    pub errors: Vec<RepairError>,
    /// Source nodes whose object does not exist
    pub skipped_sources: Vec<String>,
    pub batches_applied: usize,
    pub cancelled: bool,
}

impl RepairReport {
    pub fn new(validator: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            ..Self::default()
        }
    }

    /// True when every attempted repair succeeded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.actions.is_empty() && self.errors.is_empty() && self.skipped_sources.is_empty() {
            return format!("{}: nothing to repair", self.validator);
        }

        let mut summary = format!(
            "{}: {} repair(s), {} error(s), {} source(s) skipped",
            self.validator,
            self.actions.len(),
            self.errors.len(),
            self.skipped_sources.len(),
        );
        if self.cancelled {
            summary.push_str(" [cancelled]");
        }
        summary
    }
}
