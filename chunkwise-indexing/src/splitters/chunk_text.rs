//! Semantic splitting into size bounded chunks
use std::ops::Range;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{IngestionContext, Splitter};
use derive_builder::Builder;
use text_splitter::{Characters, ChunkConfig, TextSplitter};

const DEFAULT_MAX_CHARACTERS: usize = 2048;

/// Splits on the largest semantic unit that fits, paragraphs first, then sentences, then words
///
/// Chunks hold at most `max_characters` characters. With a `range`, chunks are packed up to
/// the range end and chunks shorter than the range start are dropped.
///
/// Uses [`text_splitter`] under the hood.
#[derive(Debug, Clone, Builder)]
#[builder(setter(strip_option), build_fn(error = "anyhow::Error"))]
pub struct ChunkText {
    #[builder(default = "DEFAULT_MAX_CHARACTERS")]
    max_characters: usize,

    /// Takes precedence over `max_characters`
    #[builder(default)]
    range: Option<Range<usize>>,

    /// Defaults to a splitter configured from `range` or `max_characters`
    #[builder(setter(into), default = "self.default_splitter()")]
    splitter: Arc<TextSplitter<Characters>>,
}

impl Default for ChunkText {
    fn default() -> Self {
        Self::from_max_characters(DEFAULT_MAX_CHARACTERS)
    }
}

impl ChunkText {
    pub fn builder() -> ChunkTextBuilder {
        ChunkTextBuilder::default()
    }

    pub fn from_max_characters(max_characters: usize) -> Self {
        let config = ChunkConfig::<Characters>::new(max_characters);

        ChunkText {
            max_characters,
            range: None,
            splitter: Arc::new(TextSplitter::new(config)),
        }
    }

    /// Chunks shorter than the start of the range are dropped
    pub fn from_chunk_range(range: Range<usize>) -> Self {
        let config = ChunkConfig::<Characters>::from(range.clone());

        ChunkText {
            max_characters: range.end,
            range: Some(range),
            splitter: Arc::new(TextSplitter::new(config)),
        }
    }

    pub fn max_characters(&self) -> usize {
        self.range.as_ref().map_or(self.max_characters, |range| range.end)
    }

    fn is_long_enough(&self, chunk: &str) -> bool {
        let min = self.range.as_ref().map_or(0, |range| range.start);
        !chunk.trim().is_empty() && chunk.trim().chars().count() >= min
    }
}

impl ChunkTextBuilder {
    fn default_splitter(&self) -> Arc<TextSplitter<Characters>> {
        let config = match (self.range.clone().flatten(), self.max_characters) {
            (Some(range), _) => ChunkConfig::<Characters>::from(range),
            (None, Some(max)) => ChunkConfig::new(max),
            (None, None) => ChunkConfig::new(DEFAULT_MAX_CHARACTERS),
        };

        Arc::new(TextSplitter::new(config))
    }
}

#[async_trait]
impl Splitter for ChunkText {
    #[tracing::instrument(skip_all, name = "splitters.chunk_text")]
    async fn split(&self, text: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        Ok(self
            .splitter
            .chunks(text)
            .filter(|chunk| self.is_long_enough(chunk))
            .map(ToString::to_string)
            .collect())
    }
}
