//! Nodes are documents after they went through an ingestion.
//!
//! A node carries the fields of the document it was built from, the merged metadata of every
//! metadata extractor and an ordered list of elements. Elements are the deduplicated chunks of the
//! document, each with a fresh id.
//!
//! A node is either entirely pre-embedded or entirely embedded. The only way from one to the other
//! is [`PreEmbeddedNode::into_embedded`], which rebuilds every element in a single pass.
use std::{fmt::Debug, path::PathBuf};

use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Document, Embedding, Embeddings, FileType, errors::IngestionError, metadata::Metadata,
    util::debug_long_utf8,
};

/// Shared behaviour of node elements
pub trait NodeElement {
    fn id(&self) -> Uuid;
    fn text(&self) -> &str;
}

/// An element that has not been embedded yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreEmbeddedText {
    pub id: Uuid,
    pub text: String,
}

impl PreEmbeddedText {
    /// Creates an element with a fresh id
    pub fn new(text: impl Into<String>) -> Self {
        PreEmbeddedText {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }

    fn with_embedding(self, embedding: Embedding) -> EmbeddedText {
        EmbeddedText {
            id: self.id,
            text: self.text,
            embedding,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedText {
    pub id: Uuid,
    pub text: String,
    pub embedding: Embedding,
}

impl Debug for EmbeddedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedText")
            .field("id", &self.id)
            .field("text", &debug_long_utf8(&self.text, 100))
            .field("embedding", &self.embedding.len())
            .finish()
    }
}

impl NodeElement for PreEmbeddedText {
    fn id(&self) -> Uuid {
        self.id
    }

    fn text(&self) -> &str {
        &self.text
    }
}

impl NodeElement for EmbeddedText {
    fn id(&self) -> Uuid {
        self.id
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// A processed document and its elements
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Node<E> {
    pub id: Uuid,
    pub file_type: FileType,
    pub file_name: String,
    pub path: PathBuf,
    /// Raw content of the originating document
    pub content: String,
    pub metadata: Metadata,
    pub embedded: Vec<E>,
}

pub type PreEmbeddedNode = Node<PreEmbeddedText>;
pub type EmbeddedNode = Node<EmbeddedText>;

impl<E: NodeElement + Debug> Debug for Node<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("file_type", &self.file_type)
            .field("file_name", &self.file_name)
            .field("path", &self.path)
            .field("content", &debug_long_utf8(&self.content, 100))
            .field("metadata", &self.metadata)
            .field("embedded", &self.embedded)
            .finish()
    }
}

impl<E: NodeElement> Node<E> {
    /// Texts of all elements, in order
    pub fn texts(&self) -> Vec<&str> {
        self.embedded.iter().map(NodeElement::text).collect()
    }

    /// Ids of all elements, in order
    pub fn element_ids(&self) -> Vec<Uuid> {
        self.embedded.iter().map(NodeElement::id).collect()
    }

    pub fn len(&self) -> usize {
        self.embedded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embedded.is_empty()
    }

    fn with_elements<T>(self, embedded: Vec<T>) -> Node<T> {
        Node {
            id: self.id,
            file_type: self.file_type,
            file_name: self.file_name,
            path: self.path,
            content: self.content,
            metadata: self.metadata,
            embedded,
        }
    }
}

impl PreEmbeddedNode {
    /// Assembles a node for a document.
    ///
    /// The node takes the document id, or a fresh one if the document has none. Every chunk gets
    /// a fresh element id. Chunks are taken as is; deduplication is the caller's concern.
    pub fn from_document(
        document: &Document,
        metadata: Metadata,
        chunks: impl IntoIterator<Item = String>,
    ) -> Self {
        Node {
            id: document.id.unwrap_or_else(Uuid::new_v4),
            file_type: document.file_type,
            file_name: document.file_name.clone(),
            path: document.path.clone(),
            content: document.content.clone(),
            metadata,
            embedded: chunks.into_iter().map(PreEmbeddedText::new).collect(),
        }
    }

    /// Texts of all elements, moved out for submission to an embedding model
    pub fn to_embeddables(&self) -> Vec<String> {
        self.embedded.iter().map(|e| e.text.clone()).collect()
    }

    /// Rebuilds every element with its embedding.
    ///
    /// Embeddings are matched positionally: the i-th embedding belongs to the i-th element.
    ///
    /// # Errors
    ///
    /// Errors if the number of embeddings differs from the number of elements, or if the
    /// embeddings do not all share one dimension.
    pub fn into_embedded(self, embeddings: Embeddings) -> Result<EmbeddedNode, IngestionError> {
        if embeddings.len() != self.embedded.len() {
            return Err(IngestionError::EmbeddingMismatch {
                expected: self.embedded.len(),
                actual: embeddings.len(),
            });
        }

        if let Some((a, b)) = embeddings.iter().map(Vec::len).dedup().take(2).collect_tuple() {
            return Err(IngestionError::EmbeddingDimensions {
                expected: a,
                actual: b,
            });
        }

        let mut node = self;
        let elements = std::mem::take(&mut node.embedded);
        let embedded = elements
            .into_iter()
            .zip(embeddings)
            .map(|(element, embedding)| element.with_embedding(embedding))
            .collect();

        Ok(node.with_elements(embedded))
    }
}

/// A node in either state, as returned by an ingestion that may or may not embed
#[derive(Debug, Clone, PartialEq)]
pub enum TextNode {
    PreEmbedded(PreEmbeddedNode),
    Embedded(EmbeddedNode),
}

impl TextNode {
    pub fn is_embedded(&self) -> bool {
        matches!(self, TextNode::Embedded(_))
    }

    pub fn id(&self) -> Uuid {
        match self {
            TextNode::PreEmbedded(node) => node.id,
            TextNode::Embedded(node) => node.id,
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        match self {
            TextNode::PreEmbedded(node) => node.texts(),
            TextNode::Embedded(node) => node.texts(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            TextNode::PreEmbedded(node) => &node.metadata,
            TextNode::Embedded(node) => &node.metadata,
        }
    }

    pub fn as_embedded(&self) -> Option<&EmbeddedNode> {
        match self {
            TextNode::Embedded(node) => Some(node),
            TextNode::PreEmbedded(_) => None,
        }
    }
}

impl From<PreEmbeddedNode> for TextNode {
    fn from(node: PreEmbeddedNode) -> Self {
        TextNode::PreEmbedded(node)
    }
}

impl From<EmbeddedNode> for TextNode {
    fn from(node: EmbeddedNode) -> Self {
        TextNode::Embedded(node)
    }
}
