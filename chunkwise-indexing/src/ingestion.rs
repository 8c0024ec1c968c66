use std::sync::Arc;
use std::time::Duration;

use chunkwise_core::{
    Document, EmbeddingModel, IngestionContext, IngestionError, Persist,
    ingestion::{
        Collaborator, DocumentFailure, EmbeddedNode, FailureReason, IngestionResult, Metadata,
        PreEmbeddedNode, StageKind, TextNode,
    },
    storage::PersistResult,
};
use futures_util::{StreamExt as _, TryStreamExt as _, future::try_join_all, stream};
use itertools::Itertools as _;

use crate::Transformations;

/// Where post-processors run when more than one splitter is configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PostProcessMode {
    /// Once, over the concatenated output of all splitters
    #[default]
    Concatenated,
    /// Independently over the output of every splitter, concatenated afterwards
    PerSplitter,
}

/// Turns documents into embedded nodes and hands them to storage
///
/// The embedding model and storage are optional. Operations that need them fail with
/// [`IngestionError::MissingCollaborator`] when they are absent.
///
/// # Example
///
/// ```no_run
/// # use chunkwise_core::Document;
/// # use chunkwise_indexing::{Ingestion, Transformations, splitters::ParagraphSplitter};
/// # async fn run() -> anyhow::Result<()> {
/// let ingestion = Ingestion::new(Transformations::new().with_splitter(ParagraphSplitter::default()));
///
/// let node = ingestion.process(&Document::new("para one\n\npara two")).await?;
/// assert_eq!(node.texts(), vec!["para one", "para two"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Ingestion {
    transformations: Transformations,
    embedding_model: Option<Arc<dyn EmbeddingModel>>,
    storage: Option<Arc<dyn Persist>>,
    concurrency: Option<usize>,
    stage_concurrency: usize,
    document_timeout: Option<Duration>,
    post_process_mode: PostProcessMode,
}

impl Default for Ingestion {
    fn default() -> Self {
        Self::new(Transformations::default())
    }
}

impl Ingestion {
    pub fn new(transformations: Transformations) -> Self {
        Ingestion {
            transformations,
            embedding_model: None,
            storage: None,
            concurrency: None,
            stage_concurrency: num_cpus::get(),
            document_timeout: None,
            post_process_mode: PostProcessMode::default(),
        }
    }

    #[must_use]
    pub fn with_embedding_model(mut self, embedding_model: impl EmbeddingModel + 'static) -> Self {
        self.embedding_model = Some(Arc::new(embedding_model));
        self
    }

    #[must_use]
    pub fn with_storage(mut self, storage: impl Persist + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Bounds the number of documents [`Ingestion::from`] indexes at the same time.
    ///
    /// Unbounded by default.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Bounds the number of extractor calls in flight for a single document.
    ///
    /// Defaults to the number of cpus.
    #[must_use]
    pub fn with_stage_concurrency(mut self, concurrency: usize) -> Self {
        self.stage_concurrency = concurrency.max(1);
        self
    }

    /// Gives up on a document if indexing it takes longer than `timeout`
    ///
    /// The node under construction is discarded.
    #[must_use]
    pub fn with_document_timeout(mut self, timeout: Duration) -> Self {
        self.document_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_post_process_mode(mut self, mode: PostProcessMode) -> Self {
        self.post_process_mode = mode;
        self
    }

    pub fn transformations(&self) -> &Transformations {
        &self.transformations
    }

    pub fn has_embedding_model(&self) -> bool {
        self.embedding_model.is_some()
    }

    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Indexes all documents concurrently
    ///
    /// Never returns an error. A failing document is logged and recorded in the result, its
    /// siblings keep running. The result only succeeds if every document succeeded.
    #[tracing::instrument(skip_all, fields(documents = documents.len()), name = "ingestion.from")]
    pub async fn from(&self, documents: &[Document]) -> IngestionResult {
        let now = std::time::Instant::now();
        tracing::info!(documents = documents.len(), "Starting ingestion");

        let concurrency = self.concurrency.unwrap_or(documents.len()).max(1);
        let results: Vec<IngestionResult> = stream::iter(documents)
            .map(|document| async move {
                match self.index(document).await {
                    Ok(result) => result,
                    Err(error) => {
                        tracing::error!(
                            document = %document.display_name(),
                            error = %error,
                            "Failed to index document"
                        );
                        IngestionResult::failed(DocumentFailure::new(
                            document,
                            FailureReason::Error(error),
                        ))
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let result: IngestionResult = results.into_iter().collect();

        let elapsed_in_seconds = now.elapsed().as_secs();
        tracing::info!(
            elapsed_in_seconds,
            success = result.success,
            failures = result.failures.len(),
            "Ingestion finished in {} seconds",
            elapsed_in_seconds
        );

        result
    }

    /// Processes, embeds and persists a single document
    ///
    /// # Errors
    ///
    /// Errors before doing any work if the embedding model or storage is missing. Otherwise errors
    /// if any step fails, or when the document timeout elapses. Storage rejecting the node is
    /// not an error, it is reported as a failed result.
    #[tracing::instrument(skip_all, fields(document = %document.display_name()), name = "ingestion.index")]
    pub async fn index(&self, document: &Document) -> Result<IngestionResult, IngestionError> {
        let missing = [
            (self.embedding_model.is_none(), Collaborator::EmbeddingModel),
            (self.storage.is_none(), Collaborator::Storage),
        ]
        .into_iter()
        .filter_map(|(absent, collaborator)| absent.then_some(collaborator))
        .collect_vec();

        if !missing.is_empty() {
            return Err(IngestionError::missing("index", missing));
        }

        let Some(after) = self.document_timeout else {
            return self.run_index(document).await;
        };

        tokio::time::timeout(after, self.run_index(document))
            .await
            .map_err(|_| IngestionError::Timeout {
                operation: "index",
                after,
            })?
    }

    async fn run_index(&self, document: &Document) -> Result<IngestionResult, IngestionError> {
        let node = self.process(document).await?;
        let node = self.embed(node).await?;

        if self.persist(&node).await?.success {
            Ok(IngestionResult::succeeded())
        } else {
            tracing::warn!(node = %node.id, "Storage did not accept every chunk");
            Ok(IngestionResult::failed(DocumentFailure::new(
                document,
                FailureReason::Rejected,
            )))
        }
    }

    /// Processes a document and embeds it if an embedding model is configured
    ///
    /// # Errors
    ///
    /// Errors if a stage or the embedding model fails
    pub async fn ingest(&self, document: &Document) -> Result<TextNode, IngestionError> {
        let node = self.process(document).await?;

        if self.embedding_model.is_none() {
            return Ok(node.into());
        }

        Ok(self.embed(node).await?.into())
    }

    /// Runs a document through all stages
    ///
    /// Pre-processors fold over the content. The splitters then run on the result, followed by
    /// the post-processors and extractors, while the metadata extractors run alongside. Chunks are
    /// deduplicated by text, blank chunks dropped, and every remaining chunk gets a fresh id.
    ///
    /// # Errors
    ///
    /// Errors with [`IngestionError::Stage`] if any stage fails
    #[tracing::instrument(skip_all, fields(document = %document.display_name()), name = "ingestion.process")]
    pub async fn process(&self, document: &Document) -> Result<PreEmbeddedNode, IngestionError> {
        let context = IngestionContext::new();

        let text = self
            .pre_process(document.content().to_string(), &context)
            .await?;

        let (chunks, metadata) = tokio::try_join!(
            self.chunk(&text, &context),
            self.extract_metadata(&text, document, &context)
        )?;

        let chunks = chunks
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .unique()
            .collect_vec();

        tracing::debug!(chunks = chunks.len(), "Processed document");

        Ok(PreEmbeddedNode::from_document(document, metadata, chunks))
    }

    /// Embeds all elements of a node in a single batch
    ///
    /// # Errors
    ///
    /// Errors if no embedding model is configured, if it fails, or if it returns a different
    /// number of embeddings than there are elements.
    #[tracing::instrument(skip_all, fields(node = %node.id, elements = node.len()), name = "ingestion.embed")]
    pub async fn embed(&self, node: PreEmbeddedNode) -> Result<EmbeddedNode, IngestionError> {
        let Some(embedding_model) = &self.embedding_model else {
            return Err(IngestionError::missing(
                "embed",
                vec![Collaborator::EmbeddingModel],
            ));
        };

        if node.is_empty() {
            return node.into_embedded(Vec::new());
        }

        let embeddings = embedding_model
            .embed(node.to_embeddables())
            .await
            .map_err(IngestionError::Embedding)?;

        node.into_embedded(embeddings)
    }

    /// Hands an embedded node to storage
    ///
    /// # Errors
    ///
    /// Errors if no storage is configured or if storage fails
    #[tracing::instrument(skip_all, fields(node = %node.id, elements = node.len()), name = "ingestion.persist")]
    pub async fn persist(&self, node: &EmbeddedNode) -> Result<PersistResult, IngestionError> {
        let Some(storage) = &self.storage else {
            return Err(IngestionError::missing("persist", vec![Collaborator::Storage]));
        };

        storage.persist(node).await.map_err(IngestionError::Persist)
    }

    async fn pre_process(
        &self,
        text: String,
        context: &IngestionContext,
    ) -> Result<String, IngestionError> {
        let mut text = text;
        for stage in self.transformations.pre_processors() {
            text = stage
                .pre_process(text, context)
                .await
                .map_err(|e| IngestionError::stage(StageKind::PreProcessor, stage.name(), e))?;
        }
        Ok(text)
    }

    async fn split(
        &self,
        text: &str,
        context: &IngestionContext,
    ) -> Result<Vec<Vec<String>>, IngestionError> {
        try_join_all(self.transformations.splitters().iter().map(|stage| async move {
            stage
                .split(text, context)
                .await
                .map_err(|e| IngestionError::stage(StageKind::Splitter, stage.name(), e))
        }))
        .await
    }

    async fn post_process(
        &self,
        chunks: Vec<String>,
        context: &IngestionContext,
    ) -> Result<Vec<String>, IngestionError> {
        let mut chunks = chunks;
        for stage in self.transformations.post_processors() {
            chunks = stage
                .post_process(chunks, context)
                .await
                .map_err(|e| IngestionError::stage(StageKind::PostProcessor, stage.name(), e))?;
        }
        Ok(chunks)
    }

    /// Splits and post-processes the text, then appends whatever the extractors derive
    async fn chunk(
        &self,
        text: &str,
        context: &IngestionContext,
    ) -> Result<Vec<String>, IngestionError> {
        let splits = self.split(text, context).await?;

        let chunks = if splits.iter().all(Vec::is_empty) {
            self.post_process(vec![text.to_string()], context).await?
        } else {
            match self.post_process_mode {
                PostProcessMode::Concatenated => {
                    self.post_process(splits.concat(), context).await?
                }
                PostProcessMode::PerSplitter => {
                    try_join_all(
                        splits
                            .into_iter()
                            .map(|chunks| self.post_process(chunks, context)),
                    )
                    .await?
                    .concat()
                }
            }
        };

        let extracted = self.extract(&chunks, context).await?;

        Ok(chunks.into_iter().chain(extracted).collect())
    }

    async fn extract(
        &self,
        chunks: &[String],
        context: &IngestionContext,
    ) -> Result<Vec<String>, IngestionError> {
        let pairs = self
            .transformations
            .extractors()
            .iter()
            .flat_map(|stage| chunks.iter().map(move |chunk| (stage, chunk)));

        let extracted: Vec<Vec<String>> = stream::iter(pairs)
            .map(|(stage, chunk)| async move {
                stage
                    .extract(chunk, context)
                    .await
                    .map_err(|e| IngestionError::stage(StageKind::Extractor, stage.name(), e))
            })
            .buffered(self.stage_concurrency)
            .try_collect()
            .await?;

        Ok(extracted.concat())
    }

    async fn extract_metadata(
        &self,
        text: &str,
        document: &Document,
        context: &IngestionContext,
    ) -> Result<Metadata, IngestionError> {
        let extracted = try_join_all(self.transformations.metadata_extractors().iter().map(
            |stage| async move {
                stage
                    .extract_metadata(text, document, context)
                    .await
                    .map_err(|e| {
                        IngestionError::stage(StageKind::MetadataExtractor, stage.name(), e)
                    })
            },
        ))
        .await?;

        Ok(extracted
            .into_iter()
            .fold(Metadata::default(), |mut metadata, other| {
                metadata.merge(other);
                metadata
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use crate::splitters::ParagraphSplitter;
    use anyhow::Result;
    use chunkwise_core::test_utils::{FakeEmbeddings, assert_texts, embedded_node};
    use chunkwise_core::{
        AsPersister as _, DisposableStore, MockEmbeddingModel, MockExtractor, MockPersist,
        MockSplitter,
    };
    use itertools::Itertools;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn failing_splitter(text: &str) -> Result<Vec<String>> {
        if text.contains("boom") {
            anyhow::bail!("cannot split {text}");
        }
        Ok(text.split("\n\n").map(ToString::to_string).collect())
    }

    #[test_log::test(tokio::test)]
    async fn test_process_without_stages_keeps_content() {
        let ingestion = Ingestion::default();

        let node = ingestion
            .process(&Document::new("just some text"))
            .await
            .unwrap();

        assert_texts(&node, &["just some text"]);
        assert!(node.metadata.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_process_empty_document() {
        let ingestion =
            Ingestion::new(Transformations::new().with_splitter(ParagraphSplitter::default()));

        let node = ingestion.process(&Document::new("")).await.unwrap();

        assert!(node.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_process_runs_stages_in_order() {
        let transformations = Transformations::new()
            .with_pre_processor(|text: String| -> Result<String> { Ok(text.replace("  ", " ")) })
            .with_pre_processor(|text: String| -> Result<String> { Ok(text.to_uppercase()) })
            .with_splitter(ParagraphSplitter::default())
            .with_post_processor(|chunks: Vec<String>| -> Result<Vec<String>> {
                Ok(chunks.into_iter().rev().collect())
            })
            .with_extractor(|chunk: &str| -> Result<Vec<String>> {
                Ok(vec![format!("about {}", chunk.to_lowercase())])
            });

        let node = Ingestion::new(transformations)
            .process(&Document::new("one  fish\n\ntwo fish"))
            .await
            .unwrap();

        assert_texts(
            &node,
            &["TWO FISH", "ONE FISH", "about two fish", "about one fish"],
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_process_deduplicates_first_wins() {
        let transformations = Transformations::new()
            .with_splitter(|text: &str| -> Result<Vec<String>> {
                Ok(text.split('|').map(ToString::to_string).collect())
            })
            .with_extractor(|_chunk: &str| -> Result<Vec<String>> { Ok(vec!["a".into()]) });

        let node = Ingestion::new(transformations)
            .process(&Document::new("b|a|b|c"))
            .await
            .unwrap();

        assert_texts(&node, &["b", "a", "c"]);
        assert_eq!(node.element_ids().iter().unique().count(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_deduplication_is_idempotent() {
        let ingestion = Ingestion::new(Transformations::new().with_splitter(
            |text: &str| -> Result<Vec<String>> {
                Ok(text.split('|').map(ToString::to_string).collect())
            },
        ));

        let first = ingestion
            .process(&Document::new("b|a| |b|c|a"))
            .await
            .unwrap();
        let second = ingestion
            .process(&Document::new(first.texts().join("|")))
            .await
            .unwrap();

        assert_texts(&first, &["b", "a", "c"]);
        assert_eq!(second.texts(), first.texts());
    }

    #[test_log::test(tokio::test)]
    async fn test_splitter_output_follows_declaration_order() {
        let transformations = Transformations::new()
            .with_splitter(SlowSplitter(Duration::from_millis(20)))
            .with_splitter(|_: &str| -> Result<Vec<String>> { Ok(vec!["fast".to_string()]) });

        let node = Ingestion::new(transformations)
            .process(&Document::new("text"))
            .await
            .unwrap();

        assert_texts(&node, &["slow text", "fast"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_extractors_are_stage_major() {
        let transformations = Transformations::new()
            .with_splitter(ParagraphSplitter::default())
            .with_extractor(|chunk: &str| -> Result<Vec<String>> { Ok(vec![format!("x {chunk}")]) })
            .with_extractor(|chunk: &str| -> Result<Vec<String>> { Ok(vec![format!("y {chunk}")]) });

        let node = Ingestion::new(transformations)
            .with_stage_concurrency(1)
            .process(&Document::new("a\n\nb"))
            .await
            .unwrap();

        assert_texts(&node, &["a", "b", "x a", "x b", "y a", "y b"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_post_processors_seed_with_text_without_splits() {
        let transformations = Transformations::new()
            .with_splitter(|_: &str| -> Result<Vec<String>> { Ok(vec![]) })
            .with_post_processor(|chunks: Vec<String>| -> Result<Vec<String>> {
                Ok(chunks.into_iter().map(|c| format!("[{c}]")).collect())
            });

        let node = Ingestion::new(transformations)
            .process(&Document::new("whole"))
            .await
            .unwrap();

        assert_texts(&node, &["[whole]"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_post_process_modes() {
        let transformations = Transformations::new()
            .with_splitter(|_: &str| -> Result<Vec<String>> { Ok(vec!["a".into(), "b".into()]) })
            .with_splitter(|_: &str| -> Result<Vec<String>> { Ok(vec!["c".into()]) })
            .with_post_processor(|chunks: Vec<String>| -> Result<Vec<String>> {
                Ok(vec![chunks.join("+")])
            });

        let concatenated = Ingestion::new(transformations.clone())
            .process(&Document::new("text"))
            .await
            .unwrap();
        let per_splitter = Ingestion::new(transformations)
            .with_post_process_mode(PostProcessMode::PerSplitter)
            .process(&Document::new("text"))
            .await
            .unwrap();

        assert_texts(&concatenated, &["a+b+c"]);
        assert_texts(&per_splitter, &["a+b", "c"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_metadata_is_merged_left_to_right() {
        let transformations = Transformations::new()
            .with_metadata_extractor(|_: &str, _: &Document| -> Result<Metadata> {
                Ok(Metadata::from([("k", "1")]))
            })
            .with_metadata_extractor(|_: &str, _: &Document| -> Result<Metadata> {
                Ok(Metadata::from([("k", "2"), ("j", "3")]))
            });

        let node = Ingestion::new(transformations)
            .process(&Document::new("text"))
            .await
            .unwrap();

        assert_eq!(node.metadata, Metadata::from([("k", "2"), ("j", "3")]));
    }

    #[test_log::test(tokio::test)]
    async fn test_metadata_extractors_see_pre_processed_text() {
        let transformations = Transformations::new()
            .with_pre_processor(|text: String| -> Result<String> { Ok(text.trim().to_string()) })
            .with_metadata_extractor(|text: &str, _: &Document| -> Result<Metadata> {
                Ok(Metadata::from([("length", text.len().to_string())]))
            });

        let node = Ingestion::new(transformations)
            .process(&Document::new("  four  "))
            .await
            .unwrap();

        assert_eq!(node.metadata.get("length"), Some("4"));
    }

    #[test_log::test(tokio::test)]
    async fn test_context_is_shared_within_a_document() {
        let mut extractor = MockExtractor::new();
        extractor.expect_extract().times(3).returning(|_, context| {
            let count = context.increment("seen");
            Ok(vec![format!("seen {count}")])
        });

        let transformations = Transformations::new()
            .with_splitter(ParagraphSplitter::default())
            .with_extractor(extractor);

        let node = Ingestion::new(transformations)
            .with_stage_concurrency(1)
            .process(&Document::new("a\n\nb\n\nc"))
            .await
            .unwrap();

        assert_texts(&node, &["a", "b", "c", "seen 1", "seen 2", "seen 3"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_stage_error_names_the_stage() {
        let mut splitter = MockSplitter::new();
        splitter
            .expect_split()
            .returning(|_, _| Err(anyhow::anyhow!("no")));
        splitter.expect_name().return_const("exploding");

        let err = Ingestion::new(Transformations::new().with_splitter(splitter))
            .process(&Document::new("text"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "The splitter `exploding` failed: no");
    }

    #[test_log::test(tokio::test)]
    async fn test_embed_requires_a_model() {
        let node = Ingestion::default()
            .process(&Document::new("text"))
            .await
            .unwrap();

        let err = Ingestion::default().embed(node).await.unwrap_err();

        assert!(err.is_missing_collaborator());
        assert_eq!(err.to_string(), "Cannot embed, no embedding model configured");
    }

    #[test_log::test(tokio::test)]
    async fn test_embed_is_one_positional_batch() {
        let mut model = MockEmbeddingModel::new();
        model
            .expect_embed()
            .times(1)
            .withf(|input| input == &["a".to_string(), "b".to_string()])
            .returning(|_| Ok(vec![vec![1.0, 0.0], vec![0.0, 1.0]]));

        let ingestion = Ingestion::new(
            Transformations::new().with_splitter(ParagraphSplitter::default()),
        )
        .with_embedding_model(model);

        let node = ingestion.process(&Document::new("a\n\nb")).await.unwrap();
        let ids = node.element_ids();
        let embedded = ingestion.embed(node).await.unwrap();

        assert_texts(&embedded, &["a", "b"]);
        assert_eq!(embedded.element_ids(), ids);
        assert_eq!(embedded.embedded[0].embedding, vec![1.0, 0.0]);
        assert_eq!(embedded.embedded[1].embedding, vec![0.0, 1.0]);
    }

    #[test_log::test(tokio::test)]
    async fn test_embed_count_mismatch() {
        let mut model = MockEmbeddingModel::new();
        model.expect_embed().returning(|_| Ok(vec![vec![1.0]]));

        let ingestion = Ingestion::new(
            Transformations::new().with_splitter(ParagraphSplitter::default()),
        )
        .with_embedding_model(model);

        let node = ingestion.process(&Document::new("a\n\nb")).await.unwrap();
        let err = ingestion.embed(node).await.unwrap_err();

        assert!(matches!(
            err,
            IngestionError::EmbeddingMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_embed_skips_model_for_empty_node() {
        let mut model = MockEmbeddingModel::new();
        model.expect_embed().never();

        let ingestion = Ingestion::default().with_embedding_model(model);
        let node = ingestion.process(&Document::new("   ")).await.unwrap();

        assert!(ingestion.embed(node).await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_persist_requires_storage() {
        let err = Ingestion::default()
            .persist(&embedded_node(&["a"], 4))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Cannot persist, no storage configured");
    }

    #[test_log::test(tokio::test)]
    async fn test_ingest_without_model_returns_pre_embedded() {
        let node = Ingestion::default()
            .ingest(&Document::new("text"))
            .await
            .unwrap();

        assert!(!node.is_embedded());
    }

    #[test_log::test(tokio::test)]
    async fn test_ingest_with_model_returns_embedded() {
        let node = Ingestion::default()
            .with_embedding_model(FakeEmbeddings::new(4))
            .ingest(&Document::new("text"))
            .await
            .unwrap();

        assert!(node.is_embedded());
    }

    #[test_log::test(tokio::test)]
    async fn test_index_fails_fast_without_collaborators() {
        let mut storage = MockPersist::new();
        storage.expect_persist().never();

        let embeddings = FakeEmbeddings::default();
        let err = Ingestion::default()
            .with_storage(storage)
            .index(&Document::new("text"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot index, no embedding model configured");

        let err = Ingestion::default()
            .with_embedding_model(embeddings.clone())
            .index(&Document::new("text"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot index, no storage configured");

        let err = Ingestion::default()
            .index(&Document::new("text"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot index, no embedding model or storage configured"
        );

        assert_eq!(embeddings.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_index_runs_embed_then_persist() {
        let mut model = MockEmbeddingModel::new();
        let mut storage = MockPersist::new();
        let mut seq = Sequence::new();

        model
            .expect_embed()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|input| Ok(input.iter().map(|_| vec![0.5; 3]).collect()));
        storage
            .expect_persist()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|node| node.texts() == vec!["a", "b"])
            .returning(|_| Ok(PersistResult::accepted()));

        let result = Ingestion::new(
            Transformations::new().with_splitter(ParagraphSplitter::default()),
        )
        .with_embedding_model(model)
        .with_storage(storage)
        .index(&Document::new("a\n\nb"))
        .await
        .unwrap();

        assert!(result.success);
        assert!(result.failures.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_index_reports_rejection() {
        let mut storage = MockPersist::new();
        storage
            .expect_persist()
            .returning(|_| Ok(PersistResult::rejected()));

        let result = Ingestion::default()
            .with_embedding_model(FakeEmbeddings::default())
            .with_storage(storage)
            .index(&Document::new("text"))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(matches!(
            result.failures[0].reason,
            FailureReason::Rejected
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_index_distinguishes_storage_errors() {
        let mut storage = MockPersist::new();
        storage
            .expect_persist()
            .returning(|_| Err(anyhow::anyhow!("connection lost")));

        let err = Ingestion::default()
            .with_embedding_model(FakeEmbeddings::default())
            .with_storage(storage)
            .index(&Document::new("text"))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::Persist(_)));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_index_times_out() {
        let transformations =
            Transformations::new().with_splitter(SlowSplitter(Duration::from_secs(10)));
        let store = MemoryStore::default();

        let err = Ingestion::new(transformations)
            .with_embedding_model(FakeEmbeddings::default())
            .with_storage(store.clone())
            .with_document_timeout(Duration::from_secs(1))
            .index(&Document::new("text"))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::Timeout { .. }));
        assert_eq!(store.len().await, 0);
    }

    #[derive(Debug)]
    struct SlowSplitter(Duration);

    #[async_trait::async_trait]
    impl chunkwise_core::Splitter for SlowSplitter {
        async fn split(&self, text: &str, _context: &IngestionContext) -> Result<Vec<String>> {
            tokio::time::sleep(self.0).await;
            Ok(vec![format!("slow {text}")])
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_from_isolates_failures() {
        let store = DisposableStore::acquire(MemoryStore::default())
            .await
            .unwrap();

        let ingestion = Ingestion::new(Transformations::new().with_splitter(failing_splitter))
            .with_embedding_model(FakeEmbeddings::default())
            .with_storage(store.as_persister());

        let good = Document::builder()
            .content("fine\n\nalso fine")
            .file_name("good.txt")
            .build()
            .unwrap();
        let bad = Document::builder()
            .content("boom")
            .file_name("bad.txt")
            .build()
            .unwrap();

        let result = ingestion.from(&[good, bad]).await;

        assert!(!result.success);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].file_name, "bad.txt");

        let stored = store.get_all().await;
        assert_eq!(
            stored.iter().map(|e| e.text.as_str()).sorted().collect_vec(),
            vec!["also fine", "fine"]
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_from_without_documents_succeeds() {
        let result = Ingestion::default().from(&[]).await;

        assert!(result.success);
    }

    #[test_log::test(tokio::test)]
    async fn test_from_with_bounded_concurrency() {
        let store = DisposableStore::acquire(MemoryStore::default())
            .await
            .unwrap();
        let embeddings = FakeEmbeddings::default();

        let documents = (0..10)
            .map(|i| Document::new(format!("document {i}")))
            .collect_vec();

        let result = Ingestion::default()
            .with_embedding_model(embeddings.clone())
            .with_storage(store.as_persister())
            .with_concurrency(2)
            .from(&documents)
            .await;

        assert!(result.success);
        assert_eq!(store.len().await, 10);
        assert_eq!(embeddings.calls(), 10);
    }
}
