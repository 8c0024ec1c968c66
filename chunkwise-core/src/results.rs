//! Outcomes of persisting and indexing
use std::path::PathBuf;

use crate::{Document, errors::IngestionError};

/// Outcome of handing a node to storage.
///
/// `success` is only true if storage accepted every submitted element. Hard failures are
/// reported as errors instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistResult {
    pub success: bool,
}

impl PersistResult {
    pub fn accepted() -> Self {
        PersistResult { success: true }
    }

    pub fn rejected() -> Self {
        PersistResult { success: false }
    }
}

impl From<bool> for PersistResult {
    fn from(success: bool) -> Self {
        PersistResult { success }
    }
}

#[derive(Debug)]
pub enum FailureReason {
    /// Storage did not accept every element
    Rejected,
    Error(IngestionError),
}

/// A document that did not make it into storage
#[derive(Debug)]
pub struct DocumentFailure {
    pub file_name: String,
    pub path: PathBuf,
    pub reason: FailureReason,
}

impl DocumentFailure {
    pub fn new(document: &Document, reason: FailureReason) -> Self {
        DocumentFailure {
            file_name: document.display_name(),
            path: document.path.clone(),
            reason,
        }
    }
}

impl std::fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            FailureReason::Rejected => write!(f, "{}: rejected by storage", self.file_name),
            FailureReason::Error(error) => write!(f, "{}: {error}", self.file_name),
        }
    }
}

/// Outcome of indexing one or more documents
#[derive(Debug, Default)]
pub struct IngestionResult {
    pub success: bool,
    pub failures: Vec<DocumentFailure>,
}

impl IngestionResult {
    pub fn succeeded() -> Self {
        IngestionResult {
            success: true,
            failures: Vec::new(),
        }
    }

    pub fn failed(failure: DocumentFailure) -> Self {
        IngestionResult {
            success: false,
            failures: vec![failure],
        }
    }

    /// Folds another result into this one. Success is the logical and of both.
    pub fn merge(&mut self, other: IngestionResult) {
        self.success &= other.success;
        self.failures.extend(other.failures);
    }
}

impl FromIterator<IngestionResult> for IngestionResult {
    fn from_iter<T: IntoIterator<Item = IngestionResult>>(iter: T) -> Self {
        iter.into_iter()
            .fold(IngestionResult::succeeded(), |mut acc, result| {
                acc.merge(result);
                acc
            })
    }
}
