//! Storage capabilities for Desk Copilot.
//!
//! Two narrow traits, one per store:
//!
//! - [`VectorIndex`]: nearest-neighbour search over chunk embeddings.
//! - [`GraphStore`]: Document / Chunk / Entity property graph with degree
//!   and adjacency queries.
//!
//! The two stores share no transaction boundary. The ingestion pipeline
//! writes them in sequence and they may transiently disagree.
//!
//! Implementations must be `Send + Sync`: one instance is shared by every
//! concurrent ingestion and query.

#[cfg(test)]
pub(crate) mod failing;
pub mod memory;

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Chunk, Document, RetrievedChunk, VectorRecord};

/// Entity type used when the extractor does not supply one.
pub const DEFAULT_ENTITY_KIND: &str = "TERM";

/// Node counts reported by [`GraphStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub documents: u64,
    pub chunks: u64,
    pub entities: u64,
}

/// Nearest-neighbour store keyed by chunk id.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](VectorIndex::upsert) | Insert or replace a batch of records |
/// | [`search`](VectorIndex::search) | Top-k records by similarity, best first |
/// | [`count`](VectorIndex::count) | Number of stored records |
/// | [`ping`](VectorIndex::ping) | Liveness check |
///
/// Every embedding in one index has the same dimension; an upsert that
/// would break this fails without writing anything.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &str;

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>>;

    async fn count(&self) -> Result<u64>;

    async fn ping(&self) -> bool;
}

/// Property-graph store for documents, chunks, and entities.
///
/// Entity names are normalized with
/// [`normalize_entity`](crate::entities::normalize_entity) by the
/// implementation on every call; callers may pass any casing.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &str;

    async fn upsert_document(&self, doc: &Document) -> Result<()>;

    async fn upsert_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Ensure `Document -HAS_CHUNK-> Chunk`.
    async fn link_doc_chunk(&self, doc_id: &str, chunk_id: &str) -> Result<()>;

    /// Insert or update an entity, returning its canonical id.
    async fn upsert_entity(&self, name: &str, kind: &str) -> Result<String>;

    /// Ensure `Chunk -ABOUT-> Entity`, creating the entity if needed.
    /// A no-op when the chunk does not exist.
    async fn link_chunk_entity(&self, chunk_id: &str, entity_id: &str) -> Result<()>;

    /// Count of distinct chunks linked to each entity.
    ///
    /// The map has one entry per requested name, keyed by the normalized
    /// name; unknown entities map to `0`.
    async fn get_entity_degrees(&self, names: &[String]) -> Result<BTreeMap<String, u64>>;

    /// Up to `limit` chunks linked to any of `names`, each at most once,
    /// in the store's natural order. Chunks without a parent document
    /// edge are not returned.
    async fn fetch_chunks_for_entities(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>>;

    async fn stats(&self) -> Result<GraphStats>;

    async fn ping(&self) -> bool;
}

/// Validate a batch against the index's current dimension.
///
/// `current` is the dimension already held by the index (`None` when
/// empty). Returns the dimension the index will hold after the batch.
pub fn check_batch_dims(current: Option<usize>, records: &[VectorRecord]) -> Result<Option<usize>> {
    let mut dims = current;
    for record in records {
        let len = record.embedding.len();
        if len == 0 {
            bail!("Vector record {} has an empty embedding", record.id);
        }
        match dims {
            Some(d) if d != len => bail!(
                "Embedding dimension mismatch for {}: index holds {}, record has {}",
                record.id,
                d,
                len
            ),
            Some(_) => {}
            None => dims = Some(len),
        }
    }
    Ok(dims)
}
