//! Statements and identifier rules
//!
//! Identifiers cannot be bound as parameters, so namespace and collection are interpolated into
//! the statements. They are validated when the store is built.
use lazy_static::lazy_static;
use regex::Regex;

use super::PgVector;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap();
}

const MAX_IDENTIFIER_LEN: usize = 63;

// Not exhaustive, covers the keywords that would break the generated statements
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "and", "as", "create", "delete", "drop", "from", "index", "insert", "into", "not",
    "null", "or", "select", "table", "update", "user", "where",
];

/// Unquoted Postgres identifier in lower case, not a reserved keyword
pub(crate) fn is_valid_identifier(identifier: &str) -> bool {
    identifier.len() <= MAX_IDENTIFIER_LEN
        && IDENTIFIER_RE.is_match(identifier)
        && !RESERVED_KEYWORDS.contains(&identifier)
}

impl PgVector {
    pub(crate) fn create_schema_sql(&self) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {}", self.namespace)
    }

    pub(crate) fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                node_id UUID NOT NULL,
                chunk TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                embedding VECTOR({}) NOT NULL
            )",
            self.table_name(),
            self.vector_size
        )
    }

    pub(crate) fn create_index_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {}_embedding_idx ON {} USING hnsw (embedding vector_cosine_ops)",
            self.collection,
            self.table_name()
        )
    }

    /// Bulk insert of one node, one array parameter per column. Rows whose id already exists are
    /// skipped and do not count as affected.
    pub(crate) fn bulk_insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (id, node_id, chunk, metadata, embedding)
            SELECT id, node_id, chunk, metadata, embedding
            FROM UNNEST($1::UUID[], $2::UUID[], $3::TEXT[], $4::JSONB[], $5::VECTOR[])
                AS t(id, node_id, chunk, metadata, embedding)
            ON CONFLICT (id) DO NOTHING",
            self.table_name()
        )
    }

    /// Nearest neighbours of `$1` by cosine distance, at most `$2` rows, optionally within a
    /// maximum distance `$3`
    pub(crate) fn search_sql(&self, with_radius: bool) -> String {
        let radius = if with_radius {
            "WHERE (embedding <=> $1) <= $3"
        } else {
            ""
        };

        format!(
            "SELECT id, node_id, chunk, metadata, 1 - (embedding <=> $1) AS score
            FROM {} {radius}
            ORDER BY embedding <=> $1
            LIMIT $2",
            self.table_name()
        )
    }
}
