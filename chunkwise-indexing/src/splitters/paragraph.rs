//! Split text on blank lines
use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{IngestionContext, Splitter};

/// Splits text into paragraphs separated by a blank line (`\n\n`)
///
/// With cleanup enabled, the default, paragraphs are trimmed and empty paragraphs dropped.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphSplitter {
    cleanup: bool,
}

impl Default for ParagraphSplitter {
    fn default() -> Self {
        Self { cleanup: true }
    }
}

impl ParagraphSplitter {
    pub fn new(cleanup: bool) -> Self {
        Self { cleanup }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let paragraphs = text.split("\n\n");

        if self.cleanup {
            paragraphs
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(ToString::to_string)
                .collect()
        } else {
            paragraphs.map(ToString::to_string).collect()
        }
    }
}

#[async_trait]
impl Splitter for ParagraphSplitter {
    #[tracing::instrument(skip_all, name = "splitters.paragraph")]
    async fn split(&self, text: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        Ok(self.split_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("para one\n\npara two", &["para one", "para two"]; "two paragraphs")]
    #[test_case("  one \n\n\n\n two\n", &["one", "two"]; "trims and drops empties")]
    #[test_case("single line\nsecond line", &["single line\nsecond line"]; "single newline is kept")]
    #[test_case("", &[]; "empty")]
    #[test_case("\n\n", &[]; "only separators")]
    fn test_split_with_cleanup(text: &str, expected: &[&str]) {
        assert_eq!(ParagraphSplitter::default().split_text(text), expected);
    }

    #[test]
    fn test_split_without_cleanup() {
        let splitter = ParagraphSplitter::new(false);

        assert_eq!(splitter.split_text(" a\n\n\n\nb"), vec![" a", "", "b"]);
    }

    #[tokio::test]
    async fn test_as_splitter() {
        let chunks = ParagraphSplitter::default()
            .split("para one\n\npara two", &IngestionContext::new())
            .await
            .unwrap();

        assert_eq!(chunks, vec!["para one", "para two"]);
    }
}
