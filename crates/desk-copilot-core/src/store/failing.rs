//! Store doubles that fail one named operation and delegate the rest to
//! the in-memory stores.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::memory::{InMemoryGraphStore, InMemoryVectorIndex};
use super::{GraphStats, GraphStore, VectorIndex};
use crate::models::{Chunk, Document, RetrievedChunk, VectorRecord};

pub(crate) struct FailingGraphStore {
    pub inner: InMemoryGraphStore,
    failing: &'static str,
}

impl FailingGraphStore {
    pub fn failing(op: &'static str) -> Self {
        Self {
            inner: InMemoryGraphStore::new(),
            failing: op,
        }
    }

    fn check(&self, op: &str) -> Result<()> {
        if self.failing == op {
            bail!("graph store unavailable during {}", op);
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for FailingGraphStore {
    fn backend(&self) -> &str {
        "failing"
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        self.check("upsert_document")?;
        self.inner.upsert_document(doc).await
    }

    async fn upsert_chunk(&self, chunk: &Chunk) -> Result<()> {
        self.check("upsert_chunk")?;
        self.inner.upsert_chunk(chunk).await
    }

    async fn link_doc_chunk(&self, doc_id: &str, chunk_id: &str) -> Result<()> {
        self.check("link_doc_chunk")?;
        self.inner.link_doc_chunk(doc_id, chunk_id).await
    }

    async fn upsert_entity(&self, name: &str, kind: &str) -> Result<String> {
        self.check("upsert_entity")?;
        self.inner.upsert_entity(name, kind).await
    }

    async fn link_chunk_entity(&self, chunk_id: &str, entity_id: &str) -> Result<()> {
        self.check("link_chunk_entity")?;
        self.inner.link_chunk_entity(chunk_id, entity_id).await
    }

    async fn get_entity_degrees(&self, names: &[String]) -> Result<BTreeMap<String, u64>> {
        self.check("get_entity_degrees")?;
        self.inner.get_entity_degrees(names).await
    }

    async fn fetch_chunks_for_entities(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        self.check("fetch_chunks_for_entities")?;
        self.inner.fetch_chunks_for_entities(names, limit).await
    }

    async fn stats(&self) -> Result<GraphStats> {
        self.check("stats")?;
        self.inner.stats().await
    }

    async fn ping(&self) -> bool {
        self.failing != "ping" && self.inner.ping().await
    }
}

pub(crate) struct FailingVectorIndex {
    pub inner: InMemoryVectorIndex,
    failing: &'static str,
}

impl FailingVectorIndex {
    pub fn failing(op: &'static str) -> Self {
        Self {
            inner: InMemoryVectorIndex::new(),
            failing: op,
        }
    }

    fn check(&self, op: &str) -> Result<()> {
        if self.failing == op {
            bail!("vector index unavailable during {}", op);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for FailingVectorIndex {
    fn backend(&self) -> &str {
        "failing"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        self.check("upsert")?;
        self.inner.upsert(records).await
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        self.check("search")?;
        self.inner.search(query, top_k).await
    }

    async fn count(&self) -> Result<u64> {
        self.check("count")?;
        self.inner.count().await
    }

    async fn ping(&self) -> bool {
        self.failing != "ping" && self.inner.ping().await
    }
}
