//! Neo4j-backed [`GraphStore`] over Bolt.
//!
//! Schema:
//!
//! ```text
//! (:Document {id, title, source, created_at, updated_at})
//!     -[:HAS_CHUNK]->
//! (:Chunk {id, doc_id, ord, text, tokens})
//!     -[:ABOUT]->
//! (:Entity {id, name, type})
//! ```
//!
//! `Entity.id` is the normalized name. Every write is a `MERGE`, so
//! concurrent ingestions of the same entity converge.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::{debug, info};

use desk_copilot_core::entities::normalize_entity;
use desk_copilot_core::models::{Chunk, ChunkMetadata, Document, RetrievedChunk};
use desk_copilot_core::store::{GraphStats, GraphStore, DEFAULT_ENTITY_KIND};

use crate::config::GraphConfig;

pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password).await?;
        debug!(uri, "connected to neo4j");
        Ok(Self { graph })
    }

    /// Connect using `[graph]` settings; the password comes from the
    /// variable named by `password_env`.
    pub async fn from_config(config: &GraphConfig) -> Result<Self> {
        let password = config.password()?;
        Self::connect(&config.uri, &config.user, &password).await
    }

    /// Create uniqueness constraints and the entity name index. Idempotent.
    pub async fn ensure_constraints(&self) -> Result<()> {
        let statements = [
            "CREATE CONSTRAINT document_id IF NOT EXISTS FOR (d:Document) REQUIRE d.id IS UNIQUE",
            "CREATE CONSTRAINT chunk_id IF NOT EXISTS FOR (c:Chunk) REQUIRE c.id IS UNIQUE",
            "CREATE CONSTRAINT entity_id IF NOT EXISTS FOR (e:Entity) REQUIRE e.id IS UNIQUE",
            "CREATE INDEX entity_name IF NOT EXISTS FOR (e:Entity) ON (e.name)",
        ];
        for statement in statements {
            self.graph.run(query(statement)).await?;
        }
        info!("neo4j constraints ensured");
        Ok(())
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    fn backend(&self) -> &str {
        "neo4j"
    }

    async fn upsert_document(&self, doc: &Document) -> Result<()> {
        let q = query(
            "MERGE (d:Document {id: $id})
             ON CREATE SET d.created_at = $created_at
             SET d.title = CASE WHEN $title = '' THEN null ELSE $title END,
                 d.source = $source,
                 d.updated_at = $updated_at",
        )
        .param("id", doc.id.clone())
        .param("title", doc.title.clone().unwrap_or_default())
        .param("source", doc.source.as_str())
        .param("created_at", doc.created_at)
        .param("updated_at", doc.updated_at);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn upsert_chunk(&self, chunk: &Chunk) -> Result<()> {
        let q = query(
            "MERGE (c:Chunk {id: $id})
             SET c.doc_id = $doc_id,
                 c.ord = $ord,
                 c.text = $text,
                 c.tokens = $tokens",
        )
        .param("id", chunk.id.clone())
        .param("doc_id", chunk.doc_id.clone())
        .param("ord", chunk.ord as i64)
        .param("text", chunk.text.clone())
        .param("tokens", chunk.token_count as i64);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn link_doc_chunk(&self, doc_id: &str, chunk_id: &str) -> Result<()> {
        let q = query(
            "MATCH (d:Document {id: $doc_id}), (c:Chunk {id: $chunk_id})
             MERGE (d)-[:HAS_CHUNK]->(c)",
        )
        .param("doc_id", doc_id)
        .param("chunk_id", chunk_id);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn upsert_entity(&self, name: &str, kind: &str) -> Result<String> {
        let id = normalize_entity(name);
        if id.is_empty() {
            anyhow::bail!("Entity name must not be blank");
        }
        let kind = if kind.trim().is_empty() {
            DEFAULT_ENTITY_KIND
        } else {
            kind
        };

        let q = query(
            "MERGE (e:Entity {id: $id})
             SET e.name = $name, e.type = $type
             RETURN e.id AS id",
        )
        .param("id", id.clone())
        .param("name", name.trim())
        .param("type", kind);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            if let Ok(stored) = row.get::<String>("id") {
                return Ok(stored);
            }
        }
        Ok(id)
    }

    async fn link_chunk_entity(&self, chunk_id: &str, entity_id: &str) -> Result<()> {
        let id = normalize_entity(entity_id);
        if id.is_empty() {
            anyhow::bail!("Entity id must not be blank");
        }
        let q = query(
            "MATCH (c:Chunk {id: $chunk_id})
             MERGE (e:Entity {id: $entity_id})
             ON CREATE SET e.name = $entity_id, e.type = $type
             MERGE (c)-[:ABOUT]->(e)",
        )
        .param("chunk_id", chunk_id)
        .param("entity_id", id)
        .param("type", DEFAULT_ENTITY_KIND);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn get_entity_degrees(&self, names: &[String]) -> Result<BTreeMap<String, u64>> {
        let mut degrees: BTreeMap<String, u64> =
            names.iter().map(|n| (normalize_entity(n), 0)).collect();
        if degrees.is_empty() {
            return Ok(degrees);
        }
        let ids: Vec<String> = degrees.keys().cloned().collect();

        let q = query(
            "MATCH (e:Entity) WHERE e.id IN $ids
             OPTIONAL MATCH (e)<-[:ABOUT]-(c:Chunk)
             RETURN e.id AS id, count(DISTINCT c) AS degree",
        )
        .param("ids", ids);

        let mut result = self.graph.execute(q).await?;
        while let Some(row) = result.next().await? {
            let (Ok(id), Ok(degree)) = (row.get::<String>("id"), row.get::<i64>("degree")) else {
                continue;
            };
            if let Some(slot) = degrees.get_mut(&id) {
                *slot = degree.max(0) as u64;
            }
        }
        Ok(degrees)
    }

    async fn fetch_chunks_for_entities(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if names.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = names.iter().map(|n| normalize_entity(n)).collect();

        let q = query(
            "UNWIND $ids AS eid
             MATCH (e:Entity {id: eid})<-[:ABOUT]-(c:Chunk)<-[:HAS_CHUNK]-(d:Document)
             RETURN DISTINCT c.id AS chunk_id, c.text AS text, c.ord AS ord,
                    d.id AS doc_id, d.title AS title
             LIMIT $limit",
        )
        .param("ids", ids)
        .param("limit", limit as i64);

        let mut result = self.graph.execute(q).await?;
        let mut seen = HashSet::new();
        let mut chunks = Vec::new();
        while let Some(row) = result.next().await? {
            let (Ok(id), Ok(text), Ok(doc_id)) = (
                row.get::<String>("chunk_id"),
                row.get::<String>("text"),
                row.get::<String>("doc_id"),
            ) else {
                continue;
            };
            if !seen.insert(id.clone()) {
                continue;
            }
            chunks.push(RetrievedChunk {
                id,
                text,
                metadata: ChunkMetadata {
                    doc_id,
                    title: row.get::<String>("title").ok(),
                    ord: row.get::<i64>("ord").unwrap_or(0).max(0) as usize,
                },
                score: 0.0,
            });
            if chunks.len() >= limit {
                break;
            }
        }
        Ok(chunks)
    }

    async fn stats(&self) -> Result<GraphStats> {
        let q = query(
            "OPTIONAL MATCH (d:Document) WITH count(d) AS documents
             OPTIONAL MATCH (c:Chunk) WITH documents, count(c) AS chunks
             OPTIONAL MATCH (e:Entity) RETURN documents, chunks, count(e) AS entities",
        );
        let mut result = self.graph.execute(q).await?;
        let mut stats = GraphStats::default();
        if let Some(row) = result.next().await? {
            stats.documents = row.get::<i64>("documents").unwrap_or(0) as u64;
            stats.chunks = row.get::<i64>("chunks").unwrap_or(0) as u64;
            stats.entities = row.get::<i64>("entities").unwrap_or(0) as u64;
        }
        Ok(stats)
    }

    async fn ping(&self) -> bool {
        match self.graph.execute(query("RETURN 1 AS ok")).await {
            Ok(mut result) => matches!(result.next().await, Ok(Some(_))),
            Err(_) => false,
        }
    }
}
