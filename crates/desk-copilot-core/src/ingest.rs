//! Ingestion pipeline: text → chunks → {vectors, graph}.
//!
//! One call to [`IngestPipeline::ingest`] is one best-effort pass that
//! writes a new Document into both stores:
//!
//! 1. Chunk the text. Zero chunks returns an empty report.
//! 2. Mint a `doc_id`; chunk ids become `{doc_id}-{ord}`.
//! 3. Embed every chunk in one batched call. A failing or malformed
//!    provider is replaced by the fallback embedder for this call.
//! 4. Upsert all vector records in one batch.
//! 5. Upsert the Document, each Chunk, and each `HAS_CHUNK` edge.
//! 6. Extract entities; upsert each and link it to every chunk that
//!    mentions it.
//! 7. Return the counts in an [`IngestReport`].
//!
//! Store failures in steps 4–6 propagate. Nothing written before the
//! failure is rolled back; every write is an upsert, so re-running with
//! the same `doc_id` ([`IngestPipeline::ingest_with_id`]) converges.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunk::{approx_tokens, split_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_TOKENS};
use crate::embedding::{validate_embeddings, Embedder, HashEmbedder};
use crate::entities::{mentions, EntityExtractor, HeuristicExtractor};
use crate::models::{chunk_id, Chunk, ChunkMetadata, Document, DocumentSource, VectorRecord};
use crate::store::{GraphStore, VectorIndex, DEFAULT_ENTITY_KIND};

/// Chunk window parameters. Out-of-range values are coerced by the
/// chunker, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestParams {
    pub chunk_tokens: i64,
    pub chunk_overlap: i64,
}

impl Default for IngestParams {
    fn default() -> Self {
        Self {
            chunk_tokens: DEFAULT_CHUNK_TOKENS as i64,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP as i64,
        }
    }
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// `None` when the text produced no chunks.
    pub doc_id: Option<String>,
    pub chunks: usize,
    /// Distinct entities extracted from this document.
    pub entities: usize,
    pub vectors: usize,
    pub elapsed_ms: u64,
    /// Whether the fallback embedder produced the vectors.
    pub embedding_fallback: bool,
}

/// One crawled page: `(url, title, text)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
}

/// Aggregate outcome of [`IngestPipeline::ingest_pages`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PagesReport {
    /// Pages that produced at least one chunk.
    pub pages: usize,
    /// Pages with no text to chunk.
    pub skipped: usize,
    pub doc_ids: Vec<String>,
    pub chunks: usize,
    /// Sum of per-page distinct entity counts.
    pub entities: usize,
    pub vectors: usize,
    pub elapsed_ms: u64,
    pub embedding_fallbacks: usize,
}

/// Sequential dual-write pipeline over a vector index and a graph store.
///
/// Holds only shared store handles; safe to share across tasks.
#[derive(Clone)]
pub struct IngestPipeline {
    vector: Arc<dyn VectorIndex>,
    graph: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
    fallback: Arc<dyn Embedder>,
    extractor: Arc<dyn EntityExtractor>,
    params: IngestParams,
}

impl IngestPipeline {
    /// Pipeline with default chunking, the heuristic extractor, and a
    /// [`HashEmbedder`] fallback matching the embedder's dimension.
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
            params: IngestParams::default(),
        }
    }

    pub fn with_params(mut self, params: IngestParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Embedder>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn params(&self) -> IngestParams {
        self.params
    }

    /// Ingest pasted text.
    pub async fn ingest(&self, title: Option<&str>, text: &str) -> Result<IngestReport> {
        self.ingest_with_source(DocumentSource::Paste, title, text)
            .await
    }

    /// Ingest text from any source under a fresh document id.
    pub async fn ingest_with_source(
        &self,
        source: DocumentSource,
        title: Option<&str>,
        text: &str,
    ) -> Result<IngestReport> {
        let doc_id = Uuid::new_v4().simple().to_string();
        self.ingest_with_id(&doc_id, source, title, text).await
    }

    /// Ingest under a caller-chosen document id.
    ///
    /// Re-running with the same id and text rewrites the same nodes,
    /// edges, and vectors.
    pub async fn ingest_with_id(
        &self,
        doc_id: &str,
        source: DocumentSource,
        title: Option<&str>,
        text: &str,
    ) -> Result<IngestReport> {
        let started = Instant::now();

        let pieces = split_text(text, self.params.chunk_tokens, self.params.chunk_overlap);
        if pieces.is_empty() {
            debug!(source = %source, "no chunks produced; nothing to ingest");
            return Ok(IngestReport::default());
        }

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .map(|piece| Chunk {
                id: chunk_id(doc_id, piece.ord),
                doc_id: doc_id.to_string(),
                ord: piece.ord,
                token_count: approx_tokens(&piece.text),
                text: piece.text,
            })
            .collect();

        // Embeddings
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let (embeddings, embedding_fallback) = self.embed_chunks(&texts).await?;

        // Vector index
        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                metadata: ChunkMetadata {
                    doc_id: doc_id.to_string(),
                    title: title.clone(),
                    ord: chunk.ord,
                },
                embedding,
            })
            .collect();
        self.vector.upsert(&records).await?;

        // Graph: document, chunks, containment edges
        let now = chrono::Utc::now().timestamp();
        let document = Document {
            id: doc_id.to_string(),
            title: title.clone(),
            source,
            created_at: now,
            updated_at: now,
        };
        self.graph.upsert_document(&document).await?;
        for chunk in &chunks {
            self.graph.upsert_chunk(chunk).await?;
            self.graph.link_doc_chunk(doc_id, &chunk.id).await?;
        }

        // Graph: entities and mention edges
        let chunk_texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let entities = self.extractor.extract(&chunk_texts);
        for entity in &entities {
            let entity_id = self.graph.upsert_entity(entity, DEFAULT_ENTITY_KIND).await?;
            for chunk in chunks.iter().filter(|c| mentions(&c.text, entity)) {
                self.graph.link_chunk_entity(&chunk.id, &entity_id).await?;
            }
        }

        let report = IngestReport {
            doc_id: Some(doc_id.to_string()),
            chunks: chunks.len(),
            entities: entities.len(),
            vectors: records.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            embedding_fallback,
        };

        info!(
            doc_id = %doc_id,
            source = %source,
            chunks = report.chunks,
            entities = report.entities,
            vectors = report.vectors,
            elapsed_ms = report.elapsed_ms,
            fallback = report.embedding_fallback,
            "document ingested"
        );

        Ok(report)
    }

    /// Ingest crawler output, one Document per page.
    ///
    /// The page title falls back to its URL. Pages without text are
    /// skipped, not treated as errors.
    pub async fn ingest_pages(&self, pages: &[CrawledPage]) -> Result<PagesReport> {
        let started = Instant::now();
        let mut summary = PagesReport::default();

        for page in pages {
            let title = page
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(page.url.as_str());
            let report = self
                .ingest_with_source(DocumentSource::Url, Some(title), &page.text)
                .await?;

            let Some(doc_id) = report.doc_id else {
                debug!(url = %page.url, "page has no text; skipped");
                summary.skipped += 1;
                continue;
            };
            summary.pages += 1;
            summary.doc_ids.push(doc_id);
            summary.chunks += report.chunks;
            summary.entities += report.entities;
            summary.vectors += report.vectors;
            if report.embedding_fallback {
                summary.embedding_fallbacks += 1;
            }
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            pages = summary.pages,
            skipped = summary.skipped,
            chunks = summary.chunks,
            "pages ingested"
        );
        Ok(summary)
    }

    /// Embed chunk texts, substituting the fallback embedder on any
    /// provider error or malformed response.
    async fn embed_chunks(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, bool)> {
        let primary = match self.embedder.embed(texts).await {
            Ok(vectors) => {
                validate_embeddings(&vectors, texts.len(), self.embedder.dims()).map(|_| vectors)
            }
            Err(e) => Err(e),
        };

        match primary {
            Ok(vectors) => Ok((vectors, false)),
            Err(err) => {
                warn!(
                    provider = self.embedder.model_name(),
                    fallback = self.fallback.model_name(),
                    error = %err,
                    "embedding provider failed; using fallback embeddings"
                );
                let vectors = self.fallback.embed(texts).await?;
                validate_embeddings(&vectors, texts.len(), self.fallback.dims())?;
                Ok((vectors, true))
            }
        }
    }
}
