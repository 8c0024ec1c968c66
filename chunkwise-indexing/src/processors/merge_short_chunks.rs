//! Merge chunks that are too short to stand on their own
use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{IngestionContext, PostProcessor};

const DEFAULT_SEPARATOR: &str = "\n\n";

/// Post-processor that merges chunks shorter than `min_characters` into the chunk that follows
///
/// A short chunk at the end is appended to the chunk before it. Lengths are counted in
/// characters.
#[derive(Debug, Clone)]
pub struct MergeShortChunks {
    min_characters: usize,
    separator: String,
}

impl MergeShortChunks {
    pub fn new(min_characters: usize) -> Self {
        Self {
            min_characters,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Text placed between merged chunks, defaults to a blank line
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn merge(&self, chunks: Vec<String>) -> Vec<String> {
        let mut merged: Vec<String> = Vec::with_capacity(chunks.len());
        let mut pending: Option<String> = None;

        for chunk in chunks {
            let chunk = match pending.take() {
                Some(short) => format!("{short}{}{chunk}", self.separator),
                None => chunk,
            };

            if chunk.chars().count() < self.min_characters {
                pending = Some(chunk);
            } else {
                merged.push(chunk);
            }
        }

        if let Some(short) = pending {
            match merged.last_mut() {
                Some(last) => {
                    last.push_str(&self.separator);
                    last.push_str(&short);
                }
                None => merged.push(short),
            }
        }

        merged
    }
}

#[async_trait]
impl PostProcessor for MergeShortChunks {
    #[tracing::instrument(skip_all, name = "processors.merge_short_chunks")]
    async fn post_process(
        &self,
        chunks: Vec<String>,
        _context: &IngestionContext,
    ) -> Result<Vec<String>> {
        Ok(self.merge(chunks))
    }
}
