//! Backend construction from configuration.
//!
//! | `[vector] backend` | Store |
//! |--------------------|-------|
//! | `memory` | [`InMemoryVectorIndex`] |
//! | `sqlite` | [`SqliteVectorIndex`] at `vector.path` |
//!
//! | `[graph] backend` | Store |
//! |-------------------|-------|
//! | `memory` | [`InMemoryGraphStore`] |
//! | `neo4j` | [`Neo4jGraphStore`] at `graph.uri` |

use anyhow::{bail, Result};
use std::sync::Arc;

use desk_copilot_core::embedding::Embedder;
use desk_copilot_core::store::memory::{InMemoryGraphStore, InMemoryVectorIndex};
use desk_copilot_core::store::{GraphStore, VectorIndex};
use desk_copilot_core::{IngestParams, IngestPipeline, Planner, Retriever};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::neo4j_graph::Neo4jGraphStore;
use crate::sqlite_index::SqliteVectorIndex;

/// The shared store and embedder handles for one process.
#[derive(Clone)]
pub struct Backends {
    pub vector: Arc<dyn VectorIndex>,
    pub graph: Arc<dyn GraphStore>,
    pub embedder: Arc<dyn Embedder>,
    config: Config,
}

impl Backends {
    pub async fn from_config(config: &Config) -> Result<Self> {
        let vector: Arc<dyn VectorIndex> = match config.vector.backend.as_str() {
            "memory" => Arc::new(InMemoryVectorIndex::new()),
            "sqlite" => Arc::new(SqliteVectorIndex::open(&config.vector.path).await?),
            other => bail!("Unknown vector backend: {}", other),
        };
        let graph: Arc<dyn GraphStore> = match config.graph.backend.as_str() {
            "memory" => Arc::new(InMemoryGraphStore::new()),
            "neo4j" => Arc::new(Neo4jGraphStore::from_config(&config.graph).await?),
            other => bail!("Unknown graph backend: {}", other),
        };
        let embedder = create_embedder(&config.embedding)?;

        tracing::debug!(
            vector = vector.backend(),
            graph = graph.backend(),
            embedder = embedder.model_name(),
            "backends ready"
        );

        Ok(Self {
            vector,
            graph,
            embedder,
            config: config.clone(),
        })
    }

    /// Assemble from existing handles.
    pub fn new(
        config: &Config,
        vector: Arc<dyn VectorIndex>,
        graph: Arc<dyn GraphStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            vector,
            graph,
            embedder,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> IngestPipeline {
        IngestPipeline::new(
            self.vector.clone(),
            self.graph.clone(),
            self.embedder.clone(),
        )
        .with_params(IngestParams {
            chunk_tokens: self.config.chunking.chunk_tokens as i64,
            chunk_overlap: self.config.chunking.chunk_overlap as i64,
        })
    }

    pub fn planner(&self) -> Planner {
        Planner::new(self.graph.clone())
            .with_top_k(self.config.retrieval.top_k)
            .with_graph_threshold(self.config.retrieval.graph_threshold)
    }

    pub fn retriever(&self) -> Retriever {
        Retriever::new(
            self.vector.clone(),
            self.graph.clone(),
            self.embedder.clone(),
        )
    }
}
