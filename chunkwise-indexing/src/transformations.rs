use std::fmt;
use std::sync::Arc;

use chunkwise_core::{Extractor, MetadataExtractor, PostProcessor, PreProcessor, Splitter};

/// The ordered stages an ingestion runs every document through
///
/// Stages run in the order they are added. Closures with the matching signature can be used
/// directly.
///
/// # Example
///
/// ```
/// # use chunkwise_indexing::{Transformations, splitters::ParagraphSplitter};
/// let transformations = Transformations::new()
///     .with_pre_processor(|text: String| -> anyhow::Result<String> { Ok(text.to_lowercase()) })
///     .with_splitter(ParagraphSplitter::default());
///
/// assert_eq!(transformations.splitters().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Transformations {
    pre_processors: Vec<Arc<dyn PreProcessor>>,
    splitters: Vec<Arc<dyn Splitter>>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    extractors: Vec<Arc<dyn Extractor>>,
    metadata_extractors: Vec<Arc<dyn MetadataExtractor>>,
}

impl Transformations {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pre_processor(mut self, pre_processor: impl PreProcessor + 'static) -> Self {
        self.pre_processors.push(Arc::new(pre_processor));
        self
    }

    #[must_use]
    pub fn with_splitter(mut self, splitter: impl Splitter + 'static) -> Self {
        self.splitters.push(Arc::new(splitter));
        self
    }

    #[must_use]
    pub fn with_post_processor(mut self, post_processor: impl PostProcessor + 'static) -> Self {
        self.post_processors.push(Arc::new(post_processor));
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractors.push(Arc::new(extractor));
        self
    }

    #[must_use]
    pub fn with_metadata_extractor(
        mut self,
        metadata_extractor: impl MetadataExtractor + 'static,
    ) -> Self {
        self.metadata_extractors.push(Arc::new(metadata_extractor));
        self
    }

    pub fn pre_processors(&self) -> &[Arc<dyn PreProcessor>] {
        &self.pre_processors
    }

    pub fn splitters(&self) -> &[Arc<dyn Splitter>] {
        &self.splitters
    }

    pub fn post_processors(&self) -> &[Arc<dyn PostProcessor>] {
        &self.post_processors
    }

    pub fn extractors(&self) -> &[Arc<dyn Extractor>] {
        &self.extractors
    }

    pub fn metadata_extractors(&self) -> &[Arc<dyn MetadataExtractor>] {
        &self.metadata_extractors
    }

    pub fn is_empty(&self) -> bool {
        self.pre_processors.is_empty()
            && self.splitters.is_empty()
            && self.post_processors.is_empty()
            && self.extractors.is_empty()
            && self.metadata_extractors.is_empty()
    }
}

impl fmt::Debug for Transformations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformations")
            .field("pre_processors", &self.pre_processors.len())
            .field("splitters", &self.splitters.len())
            .field("post_processors", &self.post_processors.len())
            .field("extractors", &self.extractors.len())
            .field("metadata_extractors", &self.metadata_extractors.len())
            .finish()
    }
}
