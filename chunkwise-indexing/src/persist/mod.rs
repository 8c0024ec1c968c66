//! Storage backends that need no external services
mod memory_store;

pub use memory_store::{MemoryRetriever, MemoryStore, MemoryStoreBuilder, StoredElement};
