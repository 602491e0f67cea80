//! Vector, graph, and hybrid retrieval.
//!
//! - [`Retriever::vector_search`]: embed the question, ask the index.
//! - [`Retriever::graph_search`]: chunks linked to question entities with
//!   positive degree, in the store's order.
//! - [`Retriever::hybrid_search`]: vector results filtered to the graph
//!   result set. Falls back to plain vector results when the graph has
//!   nothing or the intersection is empty.
//!
//! [`Retriever::retrieve`] dispatches on a [`Plan`]. `GRAPH` falls back to
//! vector search when the graph returns nothing.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::embedding::{embed_query, Embedder, HashEmbedder};
use crate::entities::{EntityExtractor, HeuristicExtractor};
use crate::models::RetrievedChunk;
use crate::planner::{Plan, RetrievalMode};
use crate::store::{GraphStore, VectorIndex};

/// Executes retrieval against the two stores. Stateless per call.
#[derive(Clone)]
pub struct Retriever {
    vector: Arc<dyn VectorIndex>,
    graph: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
    fallback: Arc<dyn Embedder>,
    extractor: Arc<dyn EntityExtractor>,
}

impl Retriever {
    pub fn new(
        vector: Arc<dyn VectorIndex>,
        graph: Arc<dyn GraphStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let fallback: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(embedder.dims()));
        Self {
            vector,
            graph,
            embedder,
            fallback,
            extractor: Arc::new(HeuristicExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Embedder>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Execute a plan.
    pub async fn retrieve(&self, plan: &Plan, question: &str) -> Result<Vec<RetrievedChunk>> {
        let top_k = plan.top_k;
        match plan.mode {
            RetrievalMode::Vector => self.vector_search(question, top_k).await,
            RetrievalMode::Hybrid => self.hybrid_search(question, top_k).await,
            RetrievalMode::Graph => {
                let hits = self.graph_search(question, top_k).await?;
                if hits.is_empty() {
                    debug!("graph search empty; falling back to vector search");
                    return self.vector_search(question, top_k).await;
                }
                Ok(hits)
            }
        }
    }

    /// Top `top_k` chunks by embedding similarity.
    pub async fn vector_search(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query = self.embed_question(question).await?;
        self.vector.search(&query, top_k).await
    }

    /// Up to `top_k` chunks linked to the question's known entities.
    pub async fn graph_search(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let candidates = self.extractor.extract(&[question]);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let degrees = self.graph.get_entity_degrees(&candidates).await?;
        let anchored: Vec<String> = degrees
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(name, _)| name)
            .collect();
        if anchored.is_empty() {
            return Ok(Vec::new());
        }
        self.graph.fetch_chunks_for_entities(&anchored, top_k).await
    }

    /// Vector recall filtered by graph reachability.
    pub async fn hybrid_search(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let graph_hits = self.graph_search(question, top_k).await?;
        if graph_hits.is_empty() {
            return self.vector_search(question, top_k).await;
        }

        let vector_hits = self.vector_search(question, top_k).await?;
        let reachable: HashSet<&str> = graph_hits.iter().map(|c| c.id.as_str()).collect();
        let filtered: Vec<RetrievedChunk> = vector_hits
            .iter()
            .filter(|c| reachable.contains(c.id.as_str()))
            .cloned()
            .collect();

        if filtered.is_empty() {
            debug!(
                graph = graph_hits.len(),
                vector = vector_hits.len(),
                "no overlap between graph and vector results; returning vector results"
            );
            return Ok(vector_hits);
        }
        Ok(filtered)
    }

    async fn embed_question(&self, question: &str) -> Result<Vec<f32>> {
        match embed_query(self.embedder.as_ref(), question).await {
            Ok(v) => Ok(v),
            Err(err) => {
                warn!(
                    provider = self.embedder.model_name(),
                    error = %err,
                    "query embedding failed; using fallback embeddings"
                );
                embed_query(self.fallback.as_ref(), question).await
            }
        }
    }
}
