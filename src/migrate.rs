use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::neo4j_graph::Neo4jGraphStore;
use crate::sqlite_index::SqliteVectorIndex;

/// Create the vector index schema. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunk_vectors (
            id TEXT PRIMARY KEY,
            doc_id TEXT NOT NULL,
            ord INTEGER NOT NULL,
            title TEXT,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            dims INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunk_vectors_doc_id ON chunk_vectors(doc_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// `desk init`: prepare whichever persistent stores are configured.
pub async fn run_init(config: &Config) -> Result<()> {
    if config.vector.backend == "sqlite" {
        let index = SqliteVectorIndex::open(&config.vector.path).await?;
        index.close().await;
        println!("Vector index ready: {}", config.vector.path.display());
    } else {
        println!("Vector index: in-memory (nothing to initialize)");
    }

    if config.graph.backend == "neo4j" {
        let graph = Neo4jGraphStore::from_config(&config.graph).await?;
        graph.ensure_constraints().await?;
        println!("Graph constraints ready: {}", config.graph.uri);
    } else {
        println!("Graph store: in-memory (nothing to initialize)");
    }

    Ok(())
}
