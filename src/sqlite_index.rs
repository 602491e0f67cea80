//! SQLite-backed [`VectorIndex`].
//!
//! One row per chunk in `chunk_vectors`, embedding stored as a
//! little-endian f32 BLOB. Search loads every vector and ranks by cosine
//! similarity in Rust, which is adequate for desk-sized corpora.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use desk_copilot_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use desk_copilot_core::models::{ChunkMetadata, RetrievedChunk, VectorRecord};
use desk_copilot_core::store::{check_batch_dims, VectorIndex};

use crate::{db, migrate};

/// Persistent vector index with the same semantics as the in-memory one.
pub struct SqliteVectorIndex {
    pool: SqlitePool,
}

impl SqliteVectorIndex {
    /// Wrap an existing pool. The schema must already exist.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `path`, creating the file and schema if needed.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn backend(&self) -> &str {
        "sqlite"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar("SELECT dims FROM chunk_vectors LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;
        check_batch_dims(current.map(|d| d as usize), records)?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO chunk_vectors (id, doc_id, ord, title, text, embedding, dims)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    doc_id = excluded.doc_id,
                    ord = excluded.ord,
                    title = excluded.title,
                    text = excluded.text,
                    embedding = excluded.embedding,
                    dims = excluded.dims
                "#,
            )
            .bind(&record.id)
            .bind(&record.metadata.doc_id)
            .bind(record.metadata.ord as i64)
            .bind(&record.metadata.title)
            .bind(&record.text)
            .bind(vec_to_blob(&record.embedding))
            .bind(record.embedding.len() as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, doc_id, ord, title, text, embedding FROM chunk_vectors ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut hits: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let ord: i64 = row.get("ord");
                RetrievedChunk {
                    id: row.get("id"),
                    text: row.get("text"),
                    metadata: ChunkMetadata {
                        doc_id: row.get("doc_id"),
                        title: row.get("title"),
                        ord: ord as usize,
                    },
                    score: cosine_similarity(query, &blob_to_vec(&blob)) as f64,
                }
            })
            .collect();

        // stable: equal scores keep rowid order
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
