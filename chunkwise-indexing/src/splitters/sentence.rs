//! Split text into sentences
use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{IngestionContext, Splitter};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SENTENCE_RE: Regex =
        Regex::new(r"[^.!?;\n\t]+[.!?;]?").expect("Invalid sentence regex");
}

/// Splits text on sentence punctuation (`.`, `!`, `?`, `;`), newlines and tabs
///
/// The punctuation stays with its sentence. With cleanup enabled, the default, sentences are
/// trimmed and empty sentences dropped.
#[derive(Debug, Clone, Copy)]
pub struct SentenceSplitter {
    cleanup: bool,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self { cleanup: true }
    }
}

impl SentenceSplitter {
    pub fn new(cleanup: bool) -> Self {
        Self { cleanup }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let sentences = SENTENCE_RE.find_iter(text).map(|m| m.as_str());

        if self.cleanup {
            sentences
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        } else {
            sentences.map(ToString::to_string).collect()
        }
    }
}

#[async_trait]
impl Splitter for SentenceSplitter {
    #[tracing::instrument(skip_all, name = "splitters.sentence")]
    async fn split(&self, text: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        Ok(self.split_text(text))
    }
}
