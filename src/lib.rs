//! # Desk Copilot
//!
//! Question answering over a local knowledge base that combines dense
//! vector search with a Document / Chunk / Entity property graph.
//!
//! The retrieval logic lives in [`desk_copilot_core`]. This crate is the
//! application shell around it: configuration, logging, the persistent
//! SQLite vector index, the Neo4j graph store, HTTP embedding providers,
//! PDF extraction, and the `desk` CLI commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────────────┐
//! │ text/PDF │──▶│ IngestPipeline│──▶│ SQLite vectors  │
//! │  pages   │   │ chunk+embed  │   │ Neo4j graph     │
//! └──────────┘   └──────────────┘   └────────┬────────┘
//!                                            │
//!            question ─▶ Planner ─▶ Retriever ┘─▶ citations
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`backends`] | Store and embedder construction from config |
//! | [`sqlite_index`] | Persistent vector index |
//! | [`neo4j_graph`] | Neo4j graph store |
//! | [`embedding`] | OpenAI, Ollama, and local embedders |
//! | [`extract`] | PDF text extraction |
//! | [`ingest`] | `ingest` and `ingest-pages` commands |
//! | [`ask`] | `plan` and `ask` commands |
//! | [`health`] | `health` command |
//! | [`db`] | SQLite connection |
//! | [`migrate`] | Schema creation and `init` |

pub mod ask;
pub mod backends;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod health;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod neo4j_graph;
pub mod sqlite_index;

pub use desk_copilot_core;
