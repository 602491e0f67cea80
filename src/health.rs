//! `desk health`: ping both stores and report counts.

use anyhow::Result;
use serde::Serialize;

use desk_copilot_core::store::GraphStats;

use crate::backends::Backends;

#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    pub backend: String,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub vector: StoreHealth,
    pub graph: StoreHealth,
    pub embedder: String,
    pub vectors: Option<u64>,
    pub graph_stats: Option<GraphStats>,
}

pub async fn check(backends: &Backends) -> HealthReport {
    let vector_ok = backends.vector.ping().await;
    let graph_ok = backends.graph.ping().await;

    let vectors = if vector_ok {
        backends.vector.count().await.ok()
    } else {
        None
    };
    let graph_stats = if graph_ok {
        backends.graph.stats().await.ok()
    } else {
        None
    };

    HealthReport {
        ok: vector_ok && graph_ok,
        vector: StoreHealth {
            backend: backends.vector.backend().to_string(),
            ok: vector_ok,
        },
        graph: StoreHealth {
            backend: backends.graph.backend().to_string(),
            ok: graph_ok,
        },
        embedder: backends.embedder.model_name().to_string(),
        vectors,
        graph_stats,
    }
}

/// Print the report; fails when either store is unreachable.
pub async fn run_health(backends: &Backends) -> Result<()> {
    let report = check(backends).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.ok {
        anyhow::bail!("one or more stores are unreachable");
    }
    Ok(())
}
