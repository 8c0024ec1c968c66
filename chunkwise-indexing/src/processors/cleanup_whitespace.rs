//! Normalize whitespace before splitting
use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{IngestionContext, PreProcessor};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HYPHENATED_RE: Regex =
        Regex::new(r"(\w+)-[ \t]*\r?\n[ \t]*(\w+)").expect("Invalid hyphenation regex");
    static ref PARAGRAPH_BREAK_RE: Regex =
        Regex::new(r"\n\s*\n").expect("Invalid paragraph regex");
}

/// Pre-processor that strips control characters and collapses whitespace
///
/// By default paragraph breaks survive as a single blank line, so a
/// [`crate::splitters::ParagraphSplitter`] can still be used afterwards. Words hyphenated across a
/// line break are joined.
#[derive(Debug, Clone, Copy)]
pub struct CleanupWhitespace {
    keep_paragraphs: bool,
    join_hyphenated: bool,
}

impl Default for CleanupWhitespace {
    fn default() -> Self {
        Self {
            keep_paragraphs: true,
            join_hyphenated: true,
        }
    }
}

impl CleanupWhitespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// If false, all whitespace, including paragraph breaks, becomes a single space
    #[must_use]
    pub fn with_keep_paragraphs(mut self, keep_paragraphs: bool) -> Self {
        self.keep_paragraphs = keep_paragraphs;
        self
    }

    #[must_use]
    pub fn with_join_hyphenated(mut self, join_hyphenated: bool) -> Self {
        self.join_hyphenated = join_hyphenated;
        self
    }

    pub fn cleanup(&self, text: &str) -> String {
        let mut cleaned = text
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
            .collect::<String>()
            .replace("\r\n", "\n");

        if self.join_hyphenated {
            cleaned = HYPHENATED_RE.replace_all(&cleaned, "$1$2").into_owned();
        }

        if !self.keep_paragraphs {
            return collapse_whitespace(&cleaned);
        }

        PARAGRAPH_BREAK_RE
            .split(&cleaned)
            .map(collapse_whitespace)
            .filter(|paragraph| !paragraph.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl PreProcessor for CleanupWhitespace {
    #[tracing::instrument(skip_all, name = "processors.cleanup_whitespace")]
    async fn pre_process(&self, text: String, _context: &IngestionContext) -> Result<String> {
        Ok(self.cleanup(&text))
    }
}
