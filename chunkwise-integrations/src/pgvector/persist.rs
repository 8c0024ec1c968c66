use anyhow::{Context as _, Result};
use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use chunkwise_core::{AsPersister, Persist, ingestion::EmbeddedNode, storage::PersistResult};

use super::PgVector;

/// Column arrays for one bulk insert
struct BulkInsertData {
    ids: Vec<Uuid>,
    node_ids: Vec<Uuid>,
    chunks: Vec<String>,
    metadata: Vec<serde_json::Value>,
    embeddings: Vec<Vector>,
}

impl BulkInsertData {
    fn from_node(node: &EmbeddedNode) -> Result<Self> {
        let metadata = serde_json::to_value(&node.metadata)?;
        let len = node.len();

        let mut data = BulkInsertData {
            ids: Vec::with_capacity(len),
            node_ids: vec![node.id; len],
            chunks: Vec::with_capacity(len),
            metadata: vec![metadata; len],
            embeddings: Vec::with_capacity(len),
        };

        for element in &node.embedded {
            data.ids.push(element.id);
            data.chunks.push(element.text.clone());
            data.embeddings.push(Vector::from(element.embedding.clone()));
        }

        Ok(data)
    }
}

#[async_trait]
impl Persist for PgVector {
    #[tracing::instrument(skip_all, name = "pgvector.persist", fields(node_id = %node.id), err)]
    async fn persist(&self, node: &EmbeddedNode) -> Result<PersistResult> {
        if node.is_empty() {
            return Ok(PersistResult::accepted());
        }

        let sql = self
            .sql_stmt_bulk_insert
            .get()
            .context("Collection not loaded, acquire the store first")?;
        let data = BulkInsertData::from_node(node)?;
        let pool = self.pool()?;

        let mut tx = pool.begin().await?;
        let affected = sqlx::query(sql)
            .bind(&data.ids)
            .bind(&data.node_ids)
            .bind(&data.chunks)
            .bind(&data.metadata)
            .bind(&data.embeddings)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert into {}", self.table_name()))?
            .rows_affected();
        tx.commit().await?;

        let submitted = node.len() as u64;
        if affected < submitted {
            tracing::warn!(
                submitted,
                affected,
                "Not every element was stored, ids already present are skipped"
            );
        }
        tracing::debug!(affected, "Persisted node");

        Ok(PersistResult::from(affected == submitted))
    }
}

impl AsPersister for PgVector {
    type Persister = PgVector;

    fn as_persister(&self) -> Self::Persister {
        self.clone()
    }
}
