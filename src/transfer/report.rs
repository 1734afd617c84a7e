//! Per-run tallies reported to the operator

use super::error::{ErrorKind, TransferError};
use super::serializer::ImportedEntity;

/// A record that could not be exported or imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// 1-based position in the processed sequence
    pub index: usize,
    pub name: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl RecordFailure {
    pub fn new(index: usize, name: Option<String>, error: &TransferError) -> Self {
        Self {
            index,
            name,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub entity_name: String,
    /// Records left after filtering
    pub found: usize,
    pub exported: usize,
    pub failures: Vec<RecordFailure>,
}

impl ExportReport {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn attempted(&self) -> usize {
        self.found
    }

    pub fn succeeded(&self) -> usize {
        self.exported
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub entity_name: String,
    pub attempted: usize,
    pub imported: Vec<ImportedEntity>,
    pub failures: Vec<RecordFailure>,
}

impl ImportReport {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.imported.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures of one kind, in record order
    pub fn failures_of(&self, kind: ErrorKind) -> impl Iterator<Item = &RecordFailure> {
        self.failures.iter().filter(move |failure| failure.kind == kind)
    }
}
