#![allow(clippy::missing_panics_doc)]
//! Helpers for testing ingestions without external services
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use pretty_assertions::assert_eq;

use crate::ingestion::{EmbeddedNode, Metadata, Node, NodeElement, PreEmbeddedNode};
use crate::{Document, EmbeddingModel, Embeddings};

/// Deterministic embedding model
///
/// Equal texts get equal vectors. Counts how many batches it embedded.
#[derive(Debug, Clone)]
pub struct FakeEmbeddings {
    dimensions: usize,
    calls: Arc<AtomicUsize>,
}

impl FakeEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        FakeEmbeddings {
            dimensions,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `embed` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        (0..self.dimensions)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                (text, i).hash(&mut hasher);
                (hasher.finish() % 1000) as f32 / 1000.0
            })
            .collect()
    }
}

impl Default for FakeEmbeddings {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl EmbeddingModel for FakeEmbeddings {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(input.iter().map(|text| self.vector_for(text)).collect())
    }
}

/// Builds a pre-embedded node with the given chunks
pub fn pre_embedded_node(chunks: &[&str]) -> PreEmbeddedNode {
    PreEmbeddedNode::from_document(
        &Document::new(chunks.join("\n\n")),
        Metadata::default(),
        chunks.iter().map(ToString::to_string),
    )
}

/// Builds an embedded node with the given chunks, embedded by [`FakeEmbeddings`]
pub fn embedded_node(chunks: &[&str], dimensions: usize) -> EmbeddedNode {
    let embeddings = FakeEmbeddings::new(dimensions);
    let vectors = chunks.iter().map(|c| embeddings.vector_for(c)).collect();

    pre_embedded_node(chunks)
        .into_embedded(vectors)
        .expect("fake embeddings always match")
}

/// Asserts the texts of a node's elements, in order
pub fn assert_texts<E: NodeElement>(node: &Node<E>, expected: &[&str]) {
    assert_eq!(node.texts(), expected);
}
