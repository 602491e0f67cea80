//! # Desk Copilot Core
//!
//! Retrieval planning and hybrid indexing for Desk Copilot: the data
//! model, chunking, entity extraction, the vector and graph store
//! capabilities, the ingestion pipeline, the planner, and the retriever.
//!
//! This crate performs no database, network, or filesystem I/O of its
//! own. Persistent stores and network embedders live in the
//! `desk-copilot` application crate and plug in through the
//! [`store::VectorIndex`], [`store::GraphStore`], and
//! [`embedding::Embedder`] traits.
//!
//! ```text
//! text ─▶ chunk ─┬─▶ Embedder ─▶ VectorIndex
//!                └─▶ EntityExtractor ─▶ GraphStore
//!
//! question ─▶ Planner (GraphStore degrees) ─▶ Retriever ─▶ citations
//! ```

pub mod chunk;
pub mod embedding;
pub mod entities;
pub mod ingest;
pub mod models;
pub mod planner;
pub mod retrieve;
pub mod store;

pub use ingest::{CrawledPage, IngestParams, IngestPipeline, IngestReport, PagesReport};
pub use planner::{Plan, Planner, RetrievalMode};
pub use retrieve::Retriever;
