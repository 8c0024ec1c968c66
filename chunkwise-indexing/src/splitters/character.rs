//! Split text into overlapping windows of characters
use anyhow::{Result, ensure};
use async_trait::async_trait;
use chunkwise_core::{IngestionContext, Splitter};

const DEFAULT_CHARACTERS: usize = 500;
const DEFAULT_OVERLAP: usize = 100;

/// Splits text into windows of roughly `characters` characters that overlap by roughly `overlap`
///
/// A window never ends inside a word: it is extended to the next whitespace. The next window
/// starts `overlap` characters before the end of the previous one, moved back to the start of a
/// word.
///
/// With cleanup enabled, the default, newlines and tabs become spaces, windows are trimmed and
/// empty windows dropped.
#[derive(Debug, Clone, Copy)]
pub struct CharacterSplitter {
    characters: usize,
    overlap: usize,
    cleanup: bool,
}

impl Default for CharacterSplitter {
    fn default() -> Self {
        Self {
            characters: DEFAULT_CHARACTERS,
            overlap: DEFAULT_OVERLAP,
            cleanup: true,
        }
    }
}

impl CharacterSplitter {
    /// # Errors
    ///
    /// Errors if `characters` is zero or `overlap` is not smaller than `characters`
    pub fn new(characters: usize, overlap: usize) -> Result<Self> {
        ensure!(characters > 0, "Window size must be larger than zero");
        ensure!(
            overlap < characters,
            "Overlap ({overlap}) must be smaller than the window size ({characters})"
        );

        Ok(Self {
            characters,
            overlap,
            cleanup: true,
        })
    }

    #[must_use]
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.characters).min(len);
            while end < len && !chars[end].is_whitespace() {
                end += 1;
            }

            self.push(&mut chunks, chars[start..end].iter().collect());

            if end == len {
                break;
            }

            let mut next = end.saturating_sub(self.overlap);
            while next > start && !chars[next].is_whitespace() {
                next -= 1;
            }

            start = if next > start { next } else { end };
        }

        chunks
    }

    fn push(&self, chunks: &mut Vec<String>, chunk: String) {
        if !self.cleanup {
            chunks.push(chunk);
            return;
        }

        let cleaned = chunk.replace(['\n', '\t'], " ");
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            chunks.push(cleaned.to_string());
        }
    }
}

#[async_trait]
impl Splitter for CharacterSplitter {
    #[tracing::instrument(skip_all, name = "splitters.character")]
    async fn split(&self, text: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        Ok(self.split_text(text))
    }
}
