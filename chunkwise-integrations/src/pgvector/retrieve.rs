use anyhow::{Context as _, Result, ensure};
use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

use chunkwise_core::{AsRetriever, Query, RetrievedChunk, RetrieverConfig, ingestion::Metadata};

use super::PgVector;

/// Searches a [`PgVector`] collection by cosine distance
///
/// Honours `limit`, `radius` and `ef` from the search params. `ef` sets `hnsw.ef_search` for the
/// duration of the query.
#[derive(Debug, Clone)]
pub struct PgVectorRetriever {
    store: PgVector,
    config: RetrieverConfig,
}

#[derive(Debug, FromRow)]
struct SearchRow {
    id: Uuid,
    node_id: Uuid,
    chunk: String,
    metadata: Json<Metadata>,
    score: f64,
}

impl From<SearchRow> for RetrievedChunk {
    #[allow(clippy::cast_possible_truncation)]
    fn from(row: SearchRow) -> Self {
        RetrievedChunk {
            id: row.id,
            node_id: row.node_id,
            text: row.chunk,
            metadata: row.metadata.0,
            score: row.score as f32,
        }
    }
}

impl PgVectorRetriever {
    async fn search(&self, embedding: Vector) -> Result<Vec<RetrievedChunk>> {
        let params = &self.config.search_params;
        let sql = self.store.search_sql(params.radius.is_some());
        let limit = i64::try_from(params.limit).context("Search limit out of range")?;

        let pool = self.store.pool()?;
        let mut tx = pool.begin().await?;

        if let Some(ef) = params.ef {
            sqlx::query(&format!("SET LOCAL hnsw.ef_search = {ef}"))
                .execute(&mut *tx)
                .await?;
        }

        let mut query = sqlx::query_as::<_, SearchRow>(&sql)
            .bind(embedding)
            .bind(limit);
        if let Some(radius) = params.radius {
            query = query.bind(f64::from(radius));
        }

        let rows = query
            .fetch_all(&mut *tx)
            .await
            .with_context(|| format!("Failed to search {}", self.store.table_name()))?;
        tx.commit().await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl Query for PgVectorRetriever {
    #[tracing::instrument(skip_all, name = "pgvector.query", err)]
    async fn query(&self, input: Vec<String>) -> Result<Vec<Vec<RetrievedChunk>>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.config.embedding_model.embed(input.clone()).await?;
        ensure!(
            embeddings.len() == input.len(),
            "Embedding model returned {} embeddings for {} queries",
            embeddings.len(),
            input.len()
        );

        let mut results = Vec::with_capacity(embeddings.len());
        for embedding in embeddings {
            results.push(self.search(Vector::from(embedding)).await?);
        }

        tracing::debug!(queries = results.len(), "Retrieved chunks");
        Ok(results)
    }
}

impl AsRetriever for PgVector {
    type Retriever = PgVectorRetriever;

    fn as_retriever(&self, config: RetrieverConfig) -> Self::Retriever {
        PgVectorRetriever {
            store: self.clone(),
            config,
        }
    }
}
