//! # Chunkwise
//!
//! Chunkwise turns documents into embedded, searchable chunks for Retrieval Augmented Generation
//! (RAG). Documents are pre-processed, split, post-processed and enriched by extractors. The
//! resulting node is embedded and persisted into a storage backend.
//!
//! ## Features
//!
//! - Five pluggable stage kinds, each a small async trait that closures implement as well
//! - Splitters, processors and model backed extractors out of the box
//! - Concurrent batch ingestion with per document failure isolation
//! - Storage backends with a scoped connection lifecycle, see [`DisposableStore`]
//! - `tracing` throughout
//!
//! ## Example
//!
//! ```no_run
//! # use anyhow::Result;
//! # use chunkwise::{DisposableStore, Document, traits::EmbeddingModel};
//! # use chunkwise::ingestion::{IntoIngestion, Transformations, splitters::ParagraphSplitter};
//! # use chunkwise::ingestion::persist::MemoryStore;
//! # async fn run(embedding_model: impl EmbeddingModel + 'static) -> Result<()> {
//! let store = DisposableStore::acquire(MemoryStore::default()).await?;
//!
//! let result = store
//!     .as_ingestion_pipeline(
//!         Transformations::new().with_splitter(ParagraphSplitter::default()),
//!         embedding_model,
//!     )
//!     .from(&[Document::new("First paragraph\n\nSecond paragraph")])
//!     .await;
//!
//! assert!(result.success);
//! store.dispose().await
//! # }
//! ```
//!
//! With the `ollama` feature, `integrations::ollama::Ollama` is an embedding model talking to a
//! local Ollama server.
//!
//! ## Feature flags
//!
//! Integrations are behind feature flags of the same name.
#![doc = document_features::document_features!()]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[doc(inline)]
pub use chunkwise_core::prompt;
#[doc(inline)]
pub use chunkwise_core::template;
#[doc(inline)]
pub use chunkwise_core::type_aliases::*;
#[doc(inline)]
pub use chunkwise_core::{Document, DocumentBuilder, FileType, IngestionContext, IngestionError};
#[doc(inline)]
pub use chunkwise_core::storage::DisposableStore;

/// Stage and capability traits
pub mod traits {
    #[doc(inline)]
    pub use chunkwise_core::indexing_traits::*;
    #[doc(inline)]
    pub use chunkwise_core::storage_traits::*;
}

/// Running documents through stages into storage
///
/// Holds the data model and the [`Ingestion`](chunkwise_indexing::Ingestion) orchestrator
/// together with the built in stages.
pub mod ingestion {
    #[doc(inline)]
    pub use chunkwise_core::ingestion::*;
    #[doc(inline)]
    pub use chunkwise_indexing::*;
}

/// Storage capabilities and results
pub mod storage {
    #[doc(inline)]
    pub use chunkwise_core::storage::*;
}

/// Integrations with external services
pub mod integrations {
    #[doc(inline)]
    pub use chunkwise_integrations::*;
}

#[doc(hidden)]
#[cfg(feature = "test-utils")]
pub mod test_utils {
    pub use chunkwise_core::test_utils::*;
}
