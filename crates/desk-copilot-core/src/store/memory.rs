//! In-memory [`VectorIndex`] and [`GraphStore`] implementations.
//!
//! State lives behind `std::sync::RwLock`, one lock per store, so each
//! node or edge upsert is atomic. Vector search is brute-force cosine
//! similarity. Nothing is persisted.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::entities::normalize_entity;
use crate::models::{Chunk, ChunkMetadata, Document, Entity, RetrievedChunk, VectorRecord};

use super::{check_batch_dims, GraphStats, GraphStore, VectorIndex, DEFAULT_ENTITY_KIND};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

// ============ Vector Index ============

#[derive(Default)]
struct VectorState {
    /// Insertion order; upserts replace in place.
    records: Vec<VectorRecord>,
    positions: HashMap<String, usize>,
    dims: Option<usize>,
}

/// In-memory vector index for tests and single-process use.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    state: RwLock<VectorState>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension held by the index, if any record was written.
    pub fn dims(&self) -> Option<usize> {
        self.state.read().ok().and_then(|s| s.dims)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut state = write(&self.state)?;
        let dims = check_batch_dims(state.dims, records)?;
        state.dims = dims;
        for record in records {
            match state.positions.get(&record.id).copied() {
                Some(pos) => state.records[pos] = record.clone(),
                None => {
                    let pos = state.records.len();
                    state.positions.insert(record.id.clone(), pos);
                    state.records.push(record.clone());
                }
            }
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let state = read(&self.state)?;
        let mut hits: Vec<RetrievedChunk> = state
            .records
            .iter()
            .map(|r| RetrievedChunk {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                score: cosine_similarity(query, &r.embedding) as f64,
            })
            .collect();
        // stable: equal scores keep insertion order
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self) -> Result<u64> {
        Ok(read(&self.state)?.records.len() as u64)
    }

    async fn ping(&self) -> bool {
        true
    }
}

// ============ Graph Store ============

struct EntityNode {
    entity: Entity,
    /// Linked chunk ids in first-link order.
    chunks: Vec<String>,
    chunk_set: HashSet<String>,
}

impl EntityNode {
    fn new(id: String, name: String, kind: String) -> Self {
        Self {
            entity: Entity { id, name, kind },
            chunks: Vec::new(),
            chunk_set: HashSet::new(),
        }
    }
}

#[derive(Default)]
struct GraphState {
    documents: HashMap<String, Document>,
    chunks: HashMap<String, Chunk>,
    /// `HAS_CHUNK` edges, chunk id -> document id.
    chunk_docs: HashMap<String, String>,
    entities: HashMap<String, EntityNode>,
}

/// In-memory property graph for tests and single-process use.
#[derive(Default)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entity by any casing of its name.
    pub fn entity(&self, name: &str) -> Option<Entity> {
        let state = self.state.read().ok()?;
        state
            .entities
            .get(&normalize_entity(name))
            .map(|n| n.entity.clone())
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        let mut state = write(&self.state)?;
        match state.documents.get_mut(&doc.id) {
            Some(existing) => {
                existing.title = doc.title.clone();
                existing.source = doc.source;
                existing.updated_at = doc.updated_at;
            }
            None => {
                state.documents.insert(doc.id.clone(), doc.clone());
            }
        }
        Ok(())
    }

    async fn upsert_chunk(&self, chunk: &Chunk) -> Result<()> {
        let mut state = write(&self.state)?;
        state.chunks.insert(chunk.id.clone(), chunk.clone());
        Ok(())
    }

    async fn link_doc_chunk(&self, doc_id: &str, chunk_id: &str) -> Result<()> {
        let mut state = write(&self.state)?;
        if !state.documents.contains_key(doc_id) || !state.chunks.contains_key(chunk_id) {
            // mirrors MATCH semantics: no edge without both endpoints
            return Ok(());
        }
        state
            .chunk_docs
            .insert(chunk_id.to_string(), doc_id.to_string());
        Ok(())
    }

    async fn upsert_entity(&self, name: &str, kind: &str) -> Result<String> {
        let id = normalize_entity(name);
        if id.is_empty() {
            bail!("Entity name must not be blank");
        }
        let kind = if kind.trim().is_empty() {
            DEFAULT_ENTITY_KIND
        } else {
            kind
        };
        let mut state = write(&self.state)?;
        let node = state
            .entities
            .entry(id.clone())
            .or_insert_with(|| EntityNode::new(id.clone(), String::new(), String::new()));
        node.entity.name = name.trim().to_string();
        node.entity.kind = kind.to_string();
        Ok(id)
    }

    async fn link_chunk_entity(&self, chunk_id: &str, entity_id: &str) -> Result<()> {
        let id = normalize_entity(entity_id);
        if id.is_empty() {
            bail!("Entity id must not be blank");
        }
        let mut state = write(&self.state)?;
        if !state.chunks.contains_key(chunk_id) {
            // same MATCH semantics as link_doc_chunk
            return Ok(());
        }
        let node = state.entities.entry(id.clone()).or_insert_with(|| {
            EntityNode::new(id.clone(), id.clone(), DEFAULT_ENTITY_KIND.to_string())
        });
        if node.chunk_set.insert(chunk_id.to_string()) {
            node.chunks.push(chunk_id.to_string());
        }
        Ok(())
    }

    async fn get_entity_degrees(&self, names: &[String]) -> Result<BTreeMap<String, u64>> {
        let state = read(&self.state)?;
        Ok(names
            .iter()
            .map(|name| {
                let id = normalize_entity(name);
                let degree = state
                    .entities
                    .get(&id)
                    .map(|n| n.chunks.len() as u64)
                    .unwrap_or(0);
                (id, degree)
            })
            .collect())
    }

    async fn fetch_chunks_for_entities(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let state = read(&self.state)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        'outer: for name in names {
            let Some(node) = state.entities.get(&normalize_entity(name)) else {
                continue;
            };
            for chunk_id in &node.chunks {
                if out.len() >= limit {
                    break 'outer;
                }
                if seen.contains(chunk_id) {
                    continue;
                }
                let (Some(chunk), Some(doc_id)) =
                    (state.chunks.get(chunk_id), state.chunk_docs.get(chunk_id))
                else {
                    continue;
                };
                seen.insert(chunk_id.clone());
                out.push(RetrievedChunk {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    metadata: ChunkMetadata {
                        doc_id: doc_id.clone(),
                        title: state.documents.get(doc_id).and_then(|d| d.title.clone()),
                        ord: chunk.ord,
                    },
                    score: 0.0,
                });
            }
        }

        Ok(out)
    }

    async fn stats(&self) -> Result<GraphStats> {
        let state = read(&self.state)?;
        Ok(GraphStats {
            documents: state.documents.len() as u64,
            chunks: state.chunks.len() as u64,
            entities: state.entities.len() as u64,
        })
    }

    async fn ping(&self) -> bool {
        true
    }
}
