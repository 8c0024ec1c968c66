use chunkwise_core::{AsPersister, EmbeddingModel};

use crate::{Ingestion, Transformations};

/// Storage that can wire an ingestion to persist into itself
///
/// Implemented for everything that can hand out a persister.
pub trait IntoIngestion: AsPersister {
    /// Builds an ingestion with the given stages and embedding model that persists into this
    /// storage
    fn as_ingestion_pipeline(
        &self,
        transformations: Transformations,
        embedding_model: impl EmbeddingModel + 'static,
    ) -> Ingestion {
        Ingestion::new(transformations)
            .with_embedding_model(embedding_model)
            .with_storage(self.as_persister())
    }
}

impl<T: AsPersister> IntoIngestion for T {}
