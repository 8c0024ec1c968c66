use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result, bail, ensure};
use async_trait::async_trait;
use chunkwise_core::{
    AsPersister, AsRetriever, Embedding, Persist, Query, RetrievedChunk, RetrieverConfig,
    VectorStore,
    ingestion::{EmbeddedNode, EmbeddedText, Metadata},
    storage::PersistResult,
    util::cosine_similarity,
};
use derive_builder::Builder;
use itertools::Itertools as _;
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_NAMESPACE: &str = "chunkwise";
const DEFAULT_COLLECTION: &str = "chunks";

/// An element as it is kept by a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredElement {
    pub id: Uuid,
    pub node_id: Uuid,
    pub text: String,
    pub metadata: Metadata,
    pub embedding: Embedding,
}

impl StoredElement {
    fn new(node: &EmbeddedNode, element: &EmbeddedText) -> Self {
        StoredElement {
            id: element.id,
            node_id: node.id,
            text: element.text.clone(),
            metadata: node.metadata.clone(),
            embedding: element.embedding.clone(),
        }
    }
}

type Collections = HashMap<String, Vec<StoredElement>>;

#[derive(Debug, Default)]
struct State {
    namespaces: HashMap<String, Collections>,
    loaded_namespace: Option<String>,
    loaded_collection: Option<String>,
}

impl State {
    fn loaded(&self) -> Result<&Vec<StoredElement>> {
        let (Some(namespace), Some(collection)) = (&self.loaded_namespace, &self.loaded_collection)
        else {
            bail!("No collection loaded");
        };

        self.namespaces
            .get(namespace)
            .and_then(|collections| collections.get(collection))
            .with_context(|| format!("Collection {namespace}.{collection} does not exist"))
    }

    fn loaded_mut(&mut self) -> Result<&mut Vec<StoredElement>> {
        let (Some(namespace), Some(collection)) = (&self.loaded_namespace, &self.loaded_collection)
        else {
            bail!("No collection loaded");
        };

        self.namespaces
            .get_mut(namespace)
            .and_then(|collections| collections.get_mut(collection))
            .with_context(|| format!("Collection {namespace}.{collection} does not exist"))
    }
}

#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned", setter(into, strip_option))]
/// A simple in-memory vector store.
///
/// Great for experimentation and testing. Clones share their data.
///
/// The store simulates the lifecycle of a real backend: it has to be connected, and its namespace
/// and collection created and loaded, before it accepts nodes. Use
/// [`chunkwise_core::DisposableStore`] to run the lifecycle. Data survives disconnecting.
///
/// With a `capacity`, the store only accepts elements while it has room. A node that does not fit
/// completely is partially written and reported as not accepted.
pub struct MemoryStore {
    #[builder(default = "DEFAULT_NAMESPACE.to_string()")]
    namespace: String,
    #[builder(default = "DEFAULT_COLLECTION.to_string()")]
    collection: String,
    /// Maximum number of elements in the collection
    #[builder(default)]
    capacity: Option<usize>,
    #[builder(setter(skip))]
    state: Arc<RwLock<State>>,
    #[builder(setter(skip))]
    connected: Arc<AtomicBool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            namespace: DEFAULT_NAMESPACE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            capacity: None,
            state: Arc::default(),
            connected: Arc::default(),
        }
    }
}

impl MemoryStore {
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    /// All elements in the configured collection, in insertion order
    pub async fn get_all(&self) -> Vec<StoredElement> {
        self.state
            .read()
            .await
            .namespaces
            .get(&self.namespace)
            .and_then(|collections| collections.get(&self.collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of elements in the configured collection
    pub async fn len(&self) -> usize {
        self.state
            .read()
            .await
            .namespaces
            .get(&self.namespace)
            .and_then(|collections| collections.get(&self.collection))
            .map_or(0, Vec::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_connected(&self) -> Result<()> {
        ensure!(self.is_connected(), "Memory store is not connected");
        Ok(())
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn create_namespace(&self) -> Result<()> {
        self.ensure_connected()?;

        self.state
            .write()
            .await
            .namespaces
            .entry(self.namespace.clone())
            .or_default();
        Ok(())
    }

    async fn load_namespace(&self) -> Result<()> {
        self.ensure_connected()?;

        let mut state = self.state.write().await;
        ensure!(
            state.namespaces.contains_key(&self.namespace),
            "Namespace {} does not exist",
            self.namespace
        );
        state.loaded_namespace = Some(self.namespace.clone());
        Ok(())
    }

    async fn create_collection(&self) -> Result<()> {
        self.ensure_connected()?;

        let mut state = self.state.write().await;
        let Some(namespace) = state.loaded_namespace.clone() else {
            bail!("No namespace loaded");
        };
        state
            .namespaces
            .entry(namespace)
            .or_default()
            .entry(self.collection.clone())
            .or_default();
        Ok(())
    }

    async fn load_collection(&self) -> Result<()> {
        self.ensure_connected()?;

        let mut state = self.state.write().await;
        let exists = state
            .loaded_namespace
            .as_ref()
            .and_then(|namespace| state.namespaces.get(namespace))
            .is_some_and(|collections| collections.contains_key(&self.collection));
        ensure!(exists, "Collection {} does not exist", self.collection);

        state.loaded_collection = Some(self.collection.clone());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.loaded_namespace = None;
        state.loaded_collection = None;
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Persist for MemoryStore {
    /// Appends every element of the node to the loaded collection
    ///
    /// Reports the node as not accepted if the capacity does not leave room for all of its
    /// elements.
    async fn persist(&self, node: &EmbeddedNode) -> Result<PersistResult> {
        self.ensure_connected()?;

        let mut state = self.state.write().await;
        let elements = state.loaded_mut()?;

        let submitted = node.embedded.len();
        let room = self
            .capacity
            .map_or(usize::MAX, |capacity| capacity.saturating_sub(elements.len()));
        let accepted = submitted.min(room);

        elements.extend(
            node.embedded
                .iter()
                .take(accepted)
                .map(|element| StoredElement::new(node, element)),
        );

        if accepted < submitted {
            tracing::warn!(
                node = %node.id,
                submitted,
                accepted,
                "Memory store is full"
            );
        }

        Ok(PersistResult::from(accepted == submitted))
    }
}

impl AsPersister for MemoryStore {
    type Persister = MemoryStore;

    fn as_persister(&self) -> Self::Persister {
        self.clone()
    }
}

impl AsRetriever for MemoryStore {
    type Retriever = MemoryRetriever;

    fn as_retriever(&self, config: RetrieverConfig) -> Self::Retriever {
        MemoryRetriever {
            store: self.clone(),
            config,
        }
    }
}

/// Brute force cosine similarity search over a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryRetriever {
    store: MemoryStore,
    config: RetrieverConfig,
}

#[async_trait]
impl Query for MemoryRetriever {
    async fn query(&self, input: Vec<String>) -> Result<Vec<Vec<RetrievedChunk>>> {
        self.store.ensure_connected()?;

        if input.is_empty() {
            return Ok(Vec::new());
        }

        let queries = self.config.embedding_model.embed(input.clone()).await?;
        ensure!(
            queries.len() == input.len(),
            "Embedding model returned {} embeddings for {} queries",
            queries.len(),
            input.len()
        );

        let state = self.store.state.read().await;
        let elements = state.loaded()?;
        let params = &self.config.search_params;

        Ok(queries
            .iter()
            .map(|query| {
                elements
                    .iter()
                    .map(|element| (element, cosine_similarity(query, &element.embedding)))
                    .filter(|(_, score)| params.radius.is_none_or(|radius| 1.0 - score <= radius))
                    .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
                    .take(params.limit)
                    .map(|(element, score)| RetrievedChunk {
                        id: element.id,
                        node_id: element.node_id,
                        text: element.text.clone(),
                        metadata: element.metadata.clone(),
                        score,
                    })
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::{
        DisposableStore, MockEmbeddingModel, SearchParams,
        test_utils::{FakeEmbeddings, embedded_node},
    };
    use pretty_assertions::assert_eq;

    #[test_log::test(tokio::test)]
    async fn test_persist_and_get_all() {
        let store = DisposableStore::acquire(MemoryStore::default())
            .await
            .unwrap();

        let node = embedded_node(&["one", "two"], 4);
        let result = store.persist(&node).await.unwrap();

        assert!(result.success);
        let stored = store.get_all().await;
        assert_eq!(
            stored.iter().map(|e| e.text.as_str()).collect::<Vec<_>>(),
            vec!["one", "two"]
        );
        assert!(stored.iter().all(|e| e.node_id == node.id));
        assert_eq!(stored[0].id, node.embedded[0].id);
    }

    #[test_log::test(tokio::test)]
    async fn test_persist_requires_lifecycle() {
        let store = MemoryStore::default();
        let node = embedded_node(&["one"], 4);

        assert!(store.persist(&node).await.is_err());

        store.connect().await.unwrap();
        let err = store.persist(&node).await.unwrap_err();
        assert_eq!(err.to_string(), "No collection loaded");
    }

    #[test_log::test(tokio::test)]
    async fn test_load_missing_namespace_fails() {
        let store = MemoryStore::default();
        store.connect().await.unwrap();

        assert!(store.load_namespace().await.is_err());
        assert!(store.create_collection().await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_capacity_rejects_partial_writes() {
        let store = MemoryStore::builder().capacity(3_usize).build().unwrap();
        let store = DisposableStore::acquire(store).await.unwrap();

        assert!(store.persist(&embedded_node(&["a", "b"], 4)).await.unwrap().success);
        assert!(!store.persist(&embedded_node(&["c", "d"], 4)).await.unwrap().success);
        assert_eq!(store.len().await, 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_data_survives_dispose() {
        let store = MemoryStore::default();
        let handle = DisposableStore::acquire(store.clone()).await.unwrap();
        handle.persist(&embedded_node(&["kept"], 4)).await.unwrap();

        handle.dispose().await.unwrap();

        assert!(!store.is_connected());
        assert_eq!(store.len().await, 1);
        assert!(store.persist(&embedded_node(&["late"], 4)).await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_collections_are_separate() {
        let store = MemoryStore::builder().collection("first").build().unwrap();
        let handle = DisposableStore::acquire(store).await.unwrap();
        handle.persist(&embedded_node(&["a"], 4)).await.unwrap();

        let other = MemoryStoreBuilder::default()
            .collection("second")
            .build()
            .unwrap();
        let other = DisposableStore::acquire(other).await.unwrap();

        assert_eq!(handle.len().await, 1);
        assert!(other.is_empty().await);
    }

    #[test_log::test(tokio::test)]
    async fn test_retrieve_orders_by_similarity() {
        let embeddings = FakeEmbeddings::new(16);
        let store = DisposableStore::acquire(MemoryStore::default())
            .await
            .unwrap();
        store
            .persist(&embedded_node(&["alpha", "beta", "gamma"], 16))
            .await
            .unwrap();

        let retriever = store.as_retriever(
            RetrieverConfig::new(embeddings).with_search_params(SearchParams::with_limit(2)),
        );

        let results = retriever
            .query(vec!["beta".to_string(), "gamma".to_string()])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].len(), 2);
        assert_eq!(results[0][0].text, "beta");
        assert!((results[0][0].score - 1.0).abs() < 1e-5);
        assert!(results[0][0].score >= results[0][1].score);
        assert_eq!(results[1][0].text, "gamma");
    }

    #[test_log::test(tokio::test)]
    async fn test_retrieve_within_radius() {
        let mut model = MockEmbeddingModel::new();
        model.expect_embed().returning(|_| Ok(vec![vec![1.0, 0.0]]));

        let store = DisposableStore::acquire(MemoryStore::default())
            .await
            .unwrap();
        let node = chunkwise_core::test_utils::pre_embedded_node(&["same", "orthogonal"])
            .into_embedded(vec![vec![2.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        store.persist(&node).await.unwrap();

        let params = SearchParams::builder().radius(0.5_f32).build().unwrap();
        let results = store
            .as_retriever(RetrieverConfig::new(model).with_search_params(params))
            .query(vec!["query".to_string()])
            .await
            .unwrap();

        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].text, "same");
    }
}
