//! `desk plan` and `desk ask`.
//!
//! Both print JSON to stdout. `ask` runs the planner, executes the plan
//! with the retriever, and converts the chunks to citations for the
//! answer-composition step.

use anyhow::Result;
use serde::Serialize;

use desk_copilot_core::models::{citations, Citation};
use desk_copilot_core::Plan;

use crate::backends::Backends;

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub plan: Plan,
    pub citations: Vec<Citation>,
}

pub async fn plan_question(
    backends: &Backends,
    question: &str,
    top_k: Option<usize>,
) -> Result<Plan> {
    backends.planner().plan_with_top_k(question, top_k).await
}

pub async fn ask(backends: &Backends, question: &str, top_k: Option<usize>) -> Result<AskResponse> {
    let plan = plan_question(backends, question, top_k).await?;
    let chunks = backends.retriever().retrieve(&plan, question).await?;
    tracing::info!(
        mode = %plan.mode,
        results = chunks.len(),
        "question answered"
    );
    Ok(AskResponse {
        question: question.to_string(),
        citations: citations(&chunks),
        plan,
    })
}

pub async fn run_plan(backends: &Backends, question: &str, top_k: Option<usize>) -> Result<()> {
    let plan = plan_question(backends, question, top_k).await?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

pub async fn run_ask(backends: &Backends, question: &str, top_k: Option<usize>) -> Result<()> {
    let response = ask(backends, question, top_k).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use desk_copilot_core::RetrievalMode;

    #[tokio::test]
    async fn test_ask_cites_ingested_chunk() {
        let backends = Backends::from_config(&Config::default()).await.unwrap();
        let report = backends
            .pipeline()
            .ingest(
                Some("Runbook"),
                "Alpha systems are patched weekly. Use ticket ABC-123 for escalations.",
            )
            .await
            .unwrap();
        let doc_id = report.doc_id.unwrap();

        let response = ask(&backends, "Where do Alpha escalations go?", None)
            .await
            .unwrap();
        assert!(matches!(
            response.plan.mode,
            RetrievalMode::Vector | RetrievalMode::Hybrid
        ));
        assert!(!response.citations.is_empty());
        assert_eq!(response.citations[0].doc_id, doc_id);
        assert_eq!(response.citations[0].title.as_deref(), Some("Runbook"));
    }

    #[tokio::test]
    async fn test_plan_on_empty_graph_is_vector() {
        let backends = Backends::from_config(&Config::default()).await.unwrap();
        let plan = plan_question(&backends, "Explain Widget Alpha", Some(3))
            .await
            .unwrap();
        assert_eq!(plan.mode, RetrievalMode::Vector);
        assert_eq!(plan.top_k, 3);
    }
}
