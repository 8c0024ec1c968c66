//! Integrations with external services
//!
//! Every integration sits behind a cargo feature of the same name.
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "ollama")]
#[cfg_attr(docsrs, doc(cfg(feature = "ollama")))]
pub mod ollama;
#[cfg(feature = "pgvector")]
#[cfg_attr(docsrs, doc(cfg(feature = "pgvector")))]
pub mod pgvector;
