use std::time::Duration;

use itertools::Itertools as _;
use thiserror::Error;

/// The kinds of stages an ingestion runs a document through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum StageKind {
    #[strum(to_string = "pre-processor")]
    PreProcessor,
    #[strum(to_string = "splitter")]
    Splitter,
    #[strum(to_string = "post-processor")]
    PostProcessor,
    #[strum(to_string = "extractor")]
    Extractor,
    #[strum(to_string = "metadata extractor")]
    MetadataExtractor,
}

/// Optional collaborators of an ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Collaborator {
    #[strum(to_string = "embedding model")]
    EmbeddingModel,
    #[strum(to_string = "storage")]
    Storage,
}

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Cannot {operation}, no {} configured", missing.iter().join(" or "))]
    MissingCollaborator {
        operation: &'static str,
        missing: Vec<Collaborator>,
    },

    #[error("The {kind} `{stage}` failed: {error:#}")]
    Stage {
        kind: StageKind,
        stage: &'static str,
        error: anyhow::Error,
    },

    #[error("Embedding model failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("Embedding model returned {actual} embeddings for {expected} texts")]
    EmbeddingMismatch { expected: usize, actual: usize },

    #[error("Embedding model returned vectors of mixed dimensions ({expected} and {actual})")]
    EmbeddingDimensions { expected: usize, actual: usize },

    #[error("Storage failed to persist: {0:#}")]
    Persist(anyhow::Error),

    #[error("Timed out after {after:?} while running {operation}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl IngestionError {
    pub fn missing(operation: &'static str, missing: Vec<Collaborator>) -> Self {
        IngestionError::MissingCollaborator { operation, missing }
    }

    pub fn stage(kind: StageKind, stage: &'static str, error: anyhow::Error) -> Self {
        IngestionError::Stage { kind, stage, error }
    }

    /// True if the error was caused by configuration rather than by running the pipeline
    pub fn is_missing_collaborator(&self) -> bool {
        matches!(self, IngestionError::MissingCollaborator { .. })
    }
}
