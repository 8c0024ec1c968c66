//! Splitters turn the pre-processed text into chunks
//!
//! [`ParagraphSplitter`], [`SentenceSplitter`] and [`CharacterSplitter`] are plain text splitters.
//! [`ChunkText`] uses [`text_splitter`] to split into chunks within a size range.
pub mod character;
pub mod chunk_text;
pub mod paragraph;
pub mod sentence;

pub use character::CharacterSplitter;
pub use chunk_text::ChunkText;
pub use paragraph::ParagraphSplitter;
pub use sentence::SentenceSplitter;
