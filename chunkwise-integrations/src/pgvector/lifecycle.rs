use anyhow::{Context as _, Result, anyhow, ensure};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::time::sleep;

use chunkwise_core::VectorStore;

use super::PgVector;

#[async_trait]
impl VectorStore for PgVector {
    #[tracing::instrument(skip_all, name = "pgvector.connect", err)]
    async fn connect(&self) -> Result<()> {
        if self.is_pool_open() {
            return Ok(());
        }

        let pool = self.create_pool().await?;
        let mut guard = self
            .connection_pool
            .write()
            .map_err(|_| anyhow!("Connection pool lock poisoned"))?;
        *guard = Some(pool);

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.is_pool_open()
    }

    #[tracing::instrument(skip_all, name = "pgvector.create_namespace", err)]
    async fn create_namespace(&self) -> Result<()> {
        sqlx::query(&self.create_schema_sql())
            .execute(&self.pool()?)
            .await
            .with_context(|| format!("Failed to create schema {}", self.namespace))?;

        Ok(())
    }

    #[tracing::instrument(skip_all, name = "pgvector.load_namespace", err)]
    async fn load_namespace(&self) -> Result<()> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
        )
        .bind(&self.namespace)
        .fetch_one(&self.pool()?)
        .await
        .context("Failed to look up schema")?;

        ensure!(exists, "Schema {} does not exist", self.namespace);
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "pgvector.create_collection", err)]
    async fn create_collection(&self) -> Result<()> {
        let pool = self.pool()?;
        let mut tx = pool.begin().await?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&mut *tx)
            .await
            .context("Failed to create the vector extension")?;

        sqlx::query(&self.create_table_sql())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to create table {}", self.table_name()))?;

        sqlx::query(&self.create_index_sql())
            .execute(&mut *tx)
            .await
            .context("Failed to create the embedding index")?;

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "pgvector.load_collection", err)]
    async fn load_collection(&self) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(self.table_name())
            .fetch_one(&self.pool()?)
            .await
            .context("Failed to look up table")?;

        ensure!(exists, "Table {} does not exist", self.table_name());

        self.sql_stmt_bulk_insert
            .get_or_init(|| self.bulk_insert_sql());
        Ok(())
    }

    #[tracing::instrument(skip_all, name = "pgvector.disconnect", err)]
    async fn disconnect(&self) -> Result<()> {
        let pool = self
            .connection_pool
            .write()
            .map_err(|_| anyhow!("Connection pool lock poisoned"))?
            .take();

        if let Some(pool) = pool {
            pool.close().await;
        }

        Ok(())
    }
}

impl PgVector {
    async fn create_pool(&self) -> Result<PgPool> {
        let pool_options = PgPoolOptions::new().max_connections(self.db_max_connections);

        for attempt in 1..=self.db_max_retry {
            match pool_options.clone().connect(&self.db_url).await {
                Ok(pool) => {
                    tracing::info!("Successfully established database connection");
                    return Ok(pool);
                }
                Err(err) if attempt < self.db_max_retry => {
                    tracing::warn!(
                        error = %err,
                        attempt,
                        max_retries = self.db_max_retry,
                        "Database connection attempt failed, retrying..."
                    );
                    sleep(self.db_conn_retry_delay).await;
                }
                Err(err) => {
                    return Err(anyhow!(err).context("Failed to establish database connection"));
                }
            }
        }

        Err(anyhow!(
            "Max connection retries ({}) exceeded",
            self.db_max_retry
        ))
    }
}
