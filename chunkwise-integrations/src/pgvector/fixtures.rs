//! Shared setup for tests against a Postgres container
use chunkwise_core::{ingestion::EmbeddedNode, test_utils::embedded_node};
use testcontainers::{ContainerAsync, GenericImage};

use crate::pgvector::PgVector;

pub(crate) const VECTOR_SIZE: usize = 3;

pub(crate) struct TestContext {
    db_url: String,
    _pgv_db_container: ContainerAsync<GenericImage>,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let (pgv_db_container, db_url) = chunkwise_test_utils::start_postgres().await;
        tracing::info!("Postgres database URL: {:#?}", db_url);

        TestContext {
            db_url,
            _pgv_db_container: pgv_db_container,
        }
    }

    /// A fresh, unconnected store on the container
    pub(crate) fn store(&self) -> PgVector {
        self.store_for("chunks")
    }

    pub(crate) fn store_for(&self, collection: &str) -> PgVector {
        PgVector::builder()
            .db_url(self.db_url.clone())
            .namespace("chunkwise_test")
            .collection(collection)
            .vector_size(i32::try_from(VECTOR_SIZE).unwrap())
            .build()
            .unwrap()
    }
}

/// A node whose i-th element points at axis `i % VECTOR_SIZE`
pub(crate) fn axis_node(chunks: &[&str]) -> EmbeddedNode {
    let mut node = embedded_node(chunks, VECTOR_SIZE);
    for (i, element) in node.embedded.iter_mut().enumerate() {
        element.embedding = (0..VECTOR_SIZE)
            .map(|axis| if axis == i % VECTOR_SIZE { 1.0 } else { 0.0 })
            .collect();
    }
    node
}
