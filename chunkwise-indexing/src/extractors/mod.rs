//! Extractors derive additional chunks from every chunk
//!
//! The model backed extractors prompt a [`chunkwise_core::SimplePrompt`] client. Their output is
//! best effort: if the client fails or responds with something that cannot be used, the failure is
//! logged and the chunk yields nothing. Use `strict` on the builder to fail the document instead.
//!
//! Every model backed extractor has a default prompt, which can be replaced. Prompts are
//! [`tera`] templates with the chunk available as `text`.
//!
//! [`DocumentMetadata`] is a metadata extractor that records where a document came from.
use anyhow::Result;

pub mod document_metadata;
pub mod keywords;
pub mod paraphrase;
pub mod questions;
pub mod summary;
pub mod title;

pub use document_metadata::DocumentMetadata;
pub use keywords::Keywords;
pub use paraphrase::Paraphrase;
pub use questions::Questions;
pub use summary::Summary;
pub use title::Title;

/// Degrades a failed extraction to no output unless `strict`
pub(crate) fn best_effort(
    result: Result<Vec<String>>,
    strict: bool,
    extractor: &'static str,
) -> Result<Vec<String>> {
    match result {
        Ok(chunks) => Ok(chunks),
        Err(error) if strict => Err(error),
        Err(error) => {
            tracing::warn!(extractor, error = %format!("{error:#}"), "Extraction failed, skipping");
            Ok(Vec::new())
        }
    }
}

/// A trimmed response as a single chunk, or nothing if it is blank
pub(crate) fn single_chunk(response: &str) -> Vec<String> {
    let response = response.trim();
    if response.is_empty() {
        Vec::new()
    } else {
        vec![response.to_string()]
    }
}
