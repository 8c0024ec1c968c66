//! Built in pre- and post-processors
pub mod cleanup_whitespace;
pub mod merge_short_chunks;

pub use cleanup_whitespace::CleanupWhitespace;
pub use merge_short_chunks::MergeShortChunks;
