//! Ingestion pipelines for chunkwise
//!
//! An [`Ingestion`] runs documents through the stages configured in [`Transformations`], then
//! optionally embeds and persists the resulting nodes.
//!
//! Built in stages live in [`splitters`], [`processors`] and [`extractors`]. Documents can be read
//! from disk with [`loaders::FileLoader`], and [`persist::MemoryStore`] is a storage backend for
//! experimentation and tests.
mod ingestion;
mod into_ingestion;
mod transformations;

pub mod extractors;
pub mod loaders;
pub mod persist;
pub mod processors;
pub mod splitters;

pub use ingestion::*;
pub use into_ingestion::IntoIngestion;
pub use transformations::Transformations;
