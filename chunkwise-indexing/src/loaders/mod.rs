//! Loaders produce documents to ingest
pub mod file_loader;

pub use file_loader::FileLoader;
