//! Retrieval planning from graph degree signals.
//!
//! | Candidates with degree > 0 | Max degree | Mode |
//! |----------------------------|------------|------|
//! | none | n/a | `VECTOR` |
//! | some | `>= graph_threshold` | `GRAPH` |
//! | some | `< graph_threshold` | `HYBRID` |
//!
//! The table is fixed; there is no scoring model.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{EntityExtractor, HeuristicExtractor};
use crate::store::GraphStore;

/// Degree at or above which an entity anchors `GRAPH` retrieval.
pub const GRAPH_THRESHOLD: u64 = 3;

/// Result count when neither config nor caller sets one.
pub const DEFAULT_TOP_K: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RetrievalMode {
    Vector,
    Graph,
    Hybrid,
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RetrievalMode::Vector => "VECTOR",
            RetrievalMode::Graph => "GRAPH",
            RetrievalMode::Hybrid => "HYBRID",
        };
        f.write_str(s)
    }
}

/// A retrieval decision for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub mode: RetrievalMode,
    pub top_k: usize,
    /// Candidates with positive degree, sorted.
    pub entities: Vec<String>,
    pub reasons: Vec<String>,
}

/// Apply the decision table to a degree map.
pub fn decide(degrees: &BTreeMap<String, u64>, graph_threshold: u64, top_k: usize) -> Plan {
    let entities: Vec<String> = degrees
        .iter()
        .filter(|(_, d)| **d > 0)
        .map(|(name, _)| name.clone())
        .collect();
    let max_degree = degrees.values().copied().max().unwrap_or(0);

    let (mode, reason) = if entities.is_empty() {
        (
            RetrievalMode::Vector,
            "No relevant entities detected".to_string(),
        )
    } else if max_degree >= graph_threshold {
        (
            RetrievalMode::Graph,
            format!("High degree entity detected ({})", max_degree),
        )
    } else {
        (
            RetrievalMode::Hybrid,
            "Entities present but graph is sparse".to_string(),
        )
    };

    Plan {
        mode,
        top_k,
        entities,
        reasons: vec![reason],
    }
}

/// Chooses a [`RetrievalMode`] per question.
#[derive(Clone)]
pub struct Planner {
    graph: Arc<dyn GraphStore>,
    extractor: Arc<dyn EntityExtractor>,
    top_k: usize,
    graph_threshold: u64,
}

impl Planner {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self {
            graph,
            extractor: Arc::new(HeuristicExtractor),
            top_k: DEFAULT_TOP_K,
            graph_threshold: GRAPH_THRESHOLD,
        }
    }

    /// Default result count; `0` keeps the current value.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        if top_k > 0 {
            self.top_k = top_k;
        }
        self
    }

    /// Degree threshold for `GRAPH` mode; `0` keeps the current value.
    pub fn with_graph_threshold(mut self, threshold: u64) -> Self {
        if threshold > 0 {
            self.graph_threshold = threshold;
        }
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn plan(&self, question: &str) -> Result<Plan> {
        self.plan_with_top_k(question, None).await
    }

    /// Plan with an optional caller override of `top_k` (ignored if `0`).
    pub async fn plan_with_top_k(&self, question: &str, top_k: Option<usize>) -> Result<Plan> {
        let top_k = top_k.filter(|k| *k > 0).unwrap_or(self.top_k);
        let candidates = self.extractor.extract(&[question]);
        let degrees = if candidates.is_empty() {
            BTreeMap::new()
        } else {
            self.graph.get_entity_degrees(&candidates).await?
        };

        let plan = decide(&degrees, self.graph_threshold, top_k);
        debug!(
            mode = %plan.mode,
            top_k = plan.top_k,
            candidates = candidates.len(),
            reasons = ?plan.reasons,
            "retrieval planned"
        );
        Ok(plan)
    }
}
