//! Core data models shared by the vector index, the graph store, and the
//! ingestion and retrieval pipelines.
//!
//! A [`Document`] owns an ordered list of [`Chunk`]s. Every chunk lives in
//! both stores: the vector index holds a [`VectorRecord`] and the graph
//! store holds the [`Chunk`] node plus a `Document -HAS_CHUNK-> Chunk` edge.
//! Retrieval from either store yields [`RetrievedChunk`]s.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Where a document's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Paste,
    Pdf,
    Url,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::Paste => "paste",
            DocumentSource::Pdf => "pdf",
            DocumentSource::Url => "url",
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "paste" => Ok(DocumentSource::Paste),
            "pdf" => Ok(DocumentSource::Pdf),
            "url" => Ok(DocumentSource::Url),
            other => bail!("Unknown document source: '{}'. Use paste, pdf, or url.", other),
        }
    }
}

/// A document node. Created once per ingestion call.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub title: Option<String>,
    pub source: DocumentSource,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds; the only field touched after creation.
    pub updated_at: i64,
}

/// A chunk node as held by the graph store.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// `{doc_id}-{ord}`.
    pub id: String,
    pub doc_id: String,
    pub ord: usize,
    pub text: String,
    /// Approximate token count, see [`approx_tokens`](crate::chunk::approx_tokens).
    pub token_count: usize,
}

/// Build the deterministic chunk id for `(doc_id, ord)`.
pub fn chunk_id(doc_id: &str, ord: usize) -> String {
    format!("{}-{}", doc_id, ord)
}

/// Metadata attached to every vector record and retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub ord: usize,
}

/// A chunk as written to the vector index.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// A chunk returned by either store.
///
/// `score` is the cosine similarity for vector hits and `0.0` for graph hits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f64,
}

/// An entity node. `id` is the normalized name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// Citation handed to the answer-composition layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub doc_id: String,
    pub chunk_id: String,
    pub score: f64,
    pub title: Option<String>,
    pub snippet: String,
}

/// Maximum characters kept in a citation snippet.
const SNIPPET_CHARS: usize = 240;

impl From<&RetrievedChunk> for Citation {
    fn from(chunk: &RetrievedChunk) -> Self {
        Citation {
            doc_id: chunk.metadata.doc_id.clone(),
            chunk_id: chunk.id.clone(),
            score: chunk.score.max(0.0),
            title: chunk.metadata.title.clone(),
            snippet: chunk.text.chars().take(SNIPPET_CHARS).collect(),
        }
    }
}

/// Convert retrieval results into citations, preserving order.
pub fn citations(chunks: &[RetrievedChunk]) -> Vec<Citation> {
    chunks.iter().map(Citation::from).collect()
}
