#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod context;
mod disposable;
mod document;
pub mod errors;
pub mod indexing_traits;
mod metadata;
mod node;
mod results;
pub mod storage_traits;
pub mod type_aliases;

pub mod prompt;
pub mod template;
pub use type_aliases::*;

/// All traits are available from the root
pub use crate::indexing_traits::*;
pub use crate::storage_traits::*;

pub use crate::context::IngestionContext;
pub use crate::disposable::DisposableStore;
pub use crate::document::{Document, DocumentBuilder, FileType};
pub use crate::errors::IngestionError;

pub mod ingestion {
    pub use crate::context::IngestionContext;
    pub use crate::document::*;
    pub use crate::errors::*;
    pub use crate::indexing_traits::*;
    pub use crate::metadata::*;
    pub use crate::node::*;
    pub use crate::results::*;
}

pub mod storage {
    pub use crate::disposable::DisposableStore;
    pub use crate::results::PersistResult;
    pub use crate::storage_traits::*;
}

/// Re-export of commonly used dependencies.
pub mod prelude;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub mod util;
