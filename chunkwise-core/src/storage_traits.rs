//! Capabilities a storage backend can expose
//!
//! Backends pick the subset they support:
//!
//! - [`Persist`] writes embedded nodes
//! - [`Query`] searches stored elements
//! - [`AsPersister`] and [`AsRetriever`] hand out handles for the above
//! - [`VectorStore`] drives the connection lifecycle, see [`crate::DisposableStore`]
//!
//! Wiring a backend into an ingestion happens in `chunkwise-indexing`, on top of
//! [`AsPersister`].
use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EmbeddingModel, indexing_traits::short_type_name, metadata::Metadata, node::EmbeddedNode,
    results::PersistResult,
};

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
use mockall::automock;

/// Number of results a search returns when no limit is configured
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Persists embedded nodes
pub trait Persist: Debug + Send + Sync {
    /// Writes every element of the node.
    ///
    /// Reports `success = false` if the backend accepted fewer elements than submitted. Hard
    /// failures, like a lost connection, are errors.
    async fn persist(&self, node: &EmbeddedNode) -> Result<PersistResult>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
impl<T: Persist + ?Sized> Persist for Arc<T> {
    async fn persist(&self, node: &EmbeddedNode) -> Result<PersistResult> {
        (**self).persist(node).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<T: Persist + ?Sized> Persist for Box<T> {
    async fn persist(&self, node: &EmbeddedNode) -> Result<PersistResult> {
        (**self).persist(node).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Backend specific search knobs
///
/// Backends ignore the knobs they do not support.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into, strip_option), build_fn(error = "anyhow::Error"))]
pub struct SearchParams {
    /// Maximum number of results per query
    #[builder(default = "DEFAULT_SEARCH_LIMIT")]
    pub limit: usize,
    /// Size of the candidate list for graph based indices (hnsw)
    #[builder(default)]
    pub ef: Option<usize>,
    /// Number of clusters probed by clustered indices (ivfflat)
    #[builder(default)]
    pub nprobe: Option<usize>,
    /// Recall level for backends that auto tune their index
    #[builder(default)]
    pub level: Option<u8>,
    /// Only return results within this cosine distance
    #[builder(default)]
    pub radius: Option<f32>,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            limit: DEFAULT_SEARCH_LIMIT,
            ef: None,
            nprobe: None,
            level: None,
            radius: None,
        }
    }
}

impl SearchParams {
    pub fn builder() -> SearchParamsBuilder {
        SearchParamsBuilder::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        SearchParams {
            limit,
            ..Default::default()
        }
    }
}

/// A stored element returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: Uuid,
    pub node_id: Uuid,
    pub text: String,
    pub metadata: Metadata,
    /// Cosine similarity to the query, higher is closer
    pub score: f32,
}

/// What a retriever needs to search
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Turns query text into vectors
    pub embedding_model: Arc<dyn EmbeddingModel>,
    pub search_params: SearchParams,
}

impl RetrieverConfig {
    pub fn new(embedding_model: impl EmbeddingModel + 'static) -> Self {
        RetrieverConfig {
            embedding_model: Arc::new(embedding_model),
            search_params: SearchParams::default(),
        }
    }

    #[must_use]
    pub fn with_search_params(mut self, search_params: SearchParams) -> Self {
        self.search_params = search_params;
        self
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Searches stored elements
pub trait Query: Debug + Send + Sync {
    /// Returns one result list per input, ordered by descending score
    async fn query(&self, input: Vec<String>) -> Result<Vec<Vec<RetrievedChunk>>>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// A backend that can hand out a persister
pub trait AsPersister {
    type Persister: Persist + 'static;

    fn as_persister(&self) -> Self::Persister;
}

/// A backend that can hand out a retriever
pub trait AsRetriever {
    type Retriever: Query + 'static;

    fn as_retriever(&self, config: RetrieverConfig) -> Self::Retriever;
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Connection lifecycle of a backend
///
/// The lifecycle runs `connect`, `create_namespace`, `load_namespace`, `create_collection` and
/// `load_collection`, in that order. Creating is idempotent: existing namespaces and collections
/// are left untouched. `disconnect` releases whatever `connect` acquired.
///
/// Use [`crate::DisposableStore`] to guarantee the release.
pub trait VectorStore: Debug + Send + Sync {
    async fn connect(&self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Ensures the namespace (database, schema) exists
    async fn create_namespace(&self) -> Result<()>;

    /// Selects the namespace for subsequent operations
    async fn load_namespace(&self) -> Result<()>;

    /// Ensures the collection (table) exists with the expected schema
    async fn create_collection(&self) -> Result<()>;

    /// Activates the collection for reads and writes
    async fn load_collection(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}
