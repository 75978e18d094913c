//! pgvector-backed protocol chunk index

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use super::config::{is_valid_identifier, VectorIndexConfig};
use crate::domain::jurisdiction::JurisdictionId;
use crate::domain::search::{ChunkMatch, VectorIndex};
use crate::domain::DomainError;

/// Protocol chunks in PostgreSQL, searched by cosine distance (`<=>`)
///
/// Expected table layout:
///
/// ```sql
/// CREATE TABLE protocol_chunks (
///     id TEXT PRIMARY KEY,
///     protocol_id TEXT NOT NULL,
///     protocol_title TEXT NOT NULL DEFAULT '',
///     section TEXT NOT NULL DEFAULT '',
///     content TEXT NOT NULL,
///     jurisdiction_id TEXT NOT NULL,
///     effective_date DATE,
///     embedding vector(1536) NOT NULL
/// );
/// ```
#[derive(Clone)]
pub struct PgVectorIndex {
    pool: PgPool,
    table_name: String,
}

impl Debug for PgVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgVectorIndex")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl PgVectorIndex {
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Result<Self, DomainError> {
        let table_name = table_name.into();

        if !is_valid_identifier(&table_name) {
            return Err(DomainError::configuration(format!(
                "'{}' is not a valid table name",
                table_name
            )));
        }

        Ok(Self { pool, table_name })
    }

    /// Connect a lazily-initialized pool from configuration
    pub fn connect_lazy(config: &VectorIndexConfig) -> Result<Self, DomainError> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            DomainError::configuration("vector_index.database_url is required")
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy(url)
            .map_err(|e| DomainError::configuration(format!("Invalid database URL: {}", e)))?;

        Self::new(pool, config.table_name.clone())
    }

    /// Create the vector extension, table and indexes if missing
    pub async fn ensure_schema(&self, dimensions: usize) -> Result<(), DomainError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::vector_index(format!("Failed to create vector extension: {}", e))
            })?;

        let table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                protocol_id TEXT NOT NULL,
                protocol_title TEXT NOT NULL DEFAULT '',
                section TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                jurisdiction_id TEXT NOT NULL,
                effective_date DATE,
                embedding vector({}) NOT NULL
            )
            "#,
            self.table_name, dimensions
        );

        sqlx::query(&table)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::vector_index(format!("Failed to create table: {}", e)))?;

        let jurisdiction_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_jurisdiction ON {} (jurisdiction_id)",
            self.table_name, self.table_name
        );

        sqlx::query(&jurisdiction_index)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::vector_index(format!("Failed to create jurisdiction index: {}", e))
            })?;

        let vector_index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_embedding ON {} USING hnsw (embedding vector_cosine_ops)",
            self.table_name, self.table_name
        );

        if let Err(e) = sqlx::query(&vector_index).execute(&self.pool).await {
            tracing::warn!(error = %e, "Could not create HNSW index, falling back to sequential scan");
        }

        Ok(())
    }

    fn search_sql(&self) -> String {
        format!(
            r#"
            SELECT id, protocol_id, protocol_title, section, content, jurisdiction_id,
                   effective_date, 1 - (embedding <=> $1::vector) AS similarity
            FROM {}
            WHERE jurisdiction_id = ANY($2)
            ORDER BY embedding <=> $1::vector, id
            LIMIT $3
            "#,
            self.table_name
        )
    }
}

/// pgvector text literal, e.g. `[0.1,0.2]`
fn to_pgvector_literal(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    fn index_type(&self) -> &'static str {
        "pgvector"
    }

    async fn query(
        &self,
        vector: &[f32],
        scope: &[JurisdictionId],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, DomainError> {
        if scope.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let scope: Vec<String> = scope.iter().map(|j| j.to_string()).collect();

        let rows = sqlx::query(&self.search_sql())
            .bind(to_pgvector_literal(vector))
            .bind(&scope)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, table = %self.table_name, "Vector search failed");
                DomainError::vector_index(format!("Search failed: {}", e))
            })?;

        let mut hits = Vec::with_capacity(rows.len());

        for row in rows {
            let jurisdiction: String = row.get("jurisdiction_id");
            let jurisdiction_id = JurisdictionId::new(jurisdiction).map_err(|e| {
                DomainError::vector_index(format!("Stored chunk has invalid jurisdiction: {}", e))
            })?;
            let similarity: f64 = row.get("similarity");
            let effective_date: Option<NaiveDate> = row.get("effective_date");

            let mut hit = ChunkMatch::new(
                row.get::<String, _>("id"),
                row.get::<String, _>("protocol_id"),
                jurisdiction_id,
                similarity as f32,
            )
            .with_title(row.get::<String, _>("protocol_title"))
            .with_section(row.get::<String, _>("section"))
            .with_content(row.get::<String, _>("content"));

            if let Some(date) = effective_date {
                hit = hit.with_effective_date(date);
            }

            hits.push(hit);
        }

        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        let result = sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::vector_index(format!("Health check failed: {}", e)))?;

        let _: i32 = result.get(0);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/protocols")
            .unwrap()
    }

    #[test]
    fn test_pgvector_literal() {
        assert_eq!(to_pgvector_literal(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
    }

    #[tokio::test]
    async fn test_rejects_unsafe_table_name() {
        assert!(PgVectorIndex::new(lazy_pool(), "chunks; DROP TABLE users").is_err());
    }

    #[tokio::test]
    async fn test_search_sql_filters_by_scope() {
        let index = PgVectorIndex::new(lazy_pool(), "protocol_chunks").unwrap();
        let sql = index.search_sql();

        assert!(sql.contains("FROM protocol_chunks"));
        assert!(sql.contains("jurisdiction_id = ANY($2)"));
        assert!(sql.contains("<=> $1::vector"));
    }

    #[tokio::test]
    async fn test_empty_scope_short_circuits() {
        let index = PgVectorIndex::new(lazy_pool(), "protocol_chunks").unwrap();

        let hits = index.query(&[1.0], &[], 5).await.unwrap();

        assert!(hits.is_empty());
    }
}
