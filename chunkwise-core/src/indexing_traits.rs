//! Traits in chunkwise allow for easy extendability
//!
//! Every stage of an ingestion is a trait. To bring your own pre-processors, splitters,
//! post-processors, extractors or metadata extractors, all you need to do is implement the trait,
//! or pass a closure with the matching signature.
//!
//! | Stage | Runs | Combined |
//! |---|---|---|
//! | [`PreProcessor`] | in order | each feeds the next |
//! | [`Splitter`] | concurrently | concatenated in declaration order |
//! | [`PostProcessor`] | in order, over the whole batch | each feeds the next |
//! | [`Extractor`] | concurrently, per chunk | concatenated in declaration order |
//! | [`MetadataExtractor`] | concurrently | merged, later stages win |
//!
//! Every stage receives the [`IngestionContext`] of the document being processed.
use std::fmt::Debug;
use std::sync::Arc;

use crate::{Document, Embeddings, IngestionContext, metadata::Metadata, prompt::Prompt};
use anyhow::Result;
use async_trait::async_trait;

/// All traits are easily mockable under tests
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
use mockall::automock;

/// Short name of a type, without its module path
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Transforms the raw text of a document before it is split
pub trait PreProcessor: Send + Sync {
    async fn pre_process(&self, text: String, context: &IngestionContext) -> Result<String>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
/// Use a closure as a pre-processor
impl<F> PreProcessor for F
where
    F: Fn(String) -> Result<String> + Send + Sync,
{
    async fn pre_process(&self, text: String, _context: &IngestionContext) -> Result<String> {
        self(text)
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Splits pre-processed text into chunks
pub trait Splitter: Send + Sync {
    async fn split(&self, text: &str, context: &IngestionContext) -> Result<Vec<String>>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
/// Use a closure as a splitter
impl<F> Splitter for F
where
    F: Fn(&str) -> Result<Vec<String>> + Send + Sync,
{
    async fn split(&self, text: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        self(text)
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Transforms the whole batch of chunks at once
///
/// Post-processors can reorder, merge or filter across chunk boundaries.
pub trait PostProcessor: Send + Sync {
    async fn post_process(
        &self,
        chunks: Vec<String>,
        context: &IngestionContext,
    ) -> Result<Vec<String>>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
/// Use a closure as a post-processor
impl<F> PostProcessor for F
where
    F: Fn(Vec<String>) -> Result<Vec<String>> + Send + Sync,
{
    async fn post_process(
        &self,
        chunks: Vec<String>,
        _context: &IngestionContext,
    ) -> Result<Vec<String>> {
        self(chunks)
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Derives additional chunks from a single chunk
///
/// The derived chunks are added next to the original chunks, i.e. a summary or a set of
/// questions the chunk answers.
pub trait Extractor: Send + Sync {
    async fn extract(&self, chunk: &str, context: &IngestionContext) -> Result<Vec<String>>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
/// Use a closure as an extractor
impl<F> Extractor for F
where
    F: Fn(&str) -> Result<Vec<String>> + Send + Sync,
{
    async fn extract(&self, chunk: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        self(chunk)
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Derives node metadata from the pre-processed text and the original document
pub trait MetadataExtractor: Send + Sync {
    async fn extract_metadata(
        &self,
        text: &str,
        document: &Document,
        context: &IngestionContext,
    ) -> Result<Metadata>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
/// Use a closure as a metadata extractor
impl<F> MetadataExtractor for F
where
    F: Fn(&str, &Document) -> Result<Metadata> + Send + Sync,
{
    async fn extract_metadata(
        &self,
        text: &str,
        document: &Document,
        _context: &IngestionContext,
    ) -> Result<Metadata> {
        self(text, document)
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Embeds a list of strings and returns its embeddings.
///
/// Implementations must return exactly one embedding per input, in input order.
pub trait EmbeddingModel: Send + Sync + Debug {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
impl<T: EmbeddingModel + ?Sized> EmbeddingModel for Arc<T> {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings> {
        (**self).embed(input).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<T: EmbeddingModel + ?Sized> EmbeddingModel for Box<T> {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings> {
        (**self).embed(input).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
/// Given a string prompt, queries an LLM
pub trait SimplePrompt: Send + Sync + Debug {
    // Takes a simple prompt, prompts the llm and returns the response
    async fn prompt(&self, prompt: Prompt) -> Result<String>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[async_trait]
impl<T: SimplePrompt + ?Sized> SimplePrompt for Arc<T> {
    async fn prompt(&self, prompt: Prompt) -> Result<String> {
        (**self).prompt(prompt).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<T: SimplePrompt + ?Sized> SimplePrompt for Box<T> {
    async fn prompt(&self, prompt: Prompt) -> Result<String> {
        (**self).prompt(prompt).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
