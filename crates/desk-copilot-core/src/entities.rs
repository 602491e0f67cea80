//! Heuristic entity extraction and entity-name canonicalization.
//!
//! The default [`HeuristicExtractor`] needs no NLP model. It is tuned for
//! recall: the graph store's degree signal filters candidates later.
//!
//! Candidates are:
//! - capitalized-word runs (`Alpha Widget Pro`), plus every right-aligned
//!   sub-phrase (`widget pro`, `pro`);
//! - every bare alphabetic word of 4+ letters.
//!
//! All candidates pass through [`normalize_entity`], are de-duplicated, and
//! are returned sorted.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static CAPITALIZED_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*").expect("valid regex"));

static LONG_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z]{4,}\b").expect("valid regex"));

/// Canonical entity identity: trimmed and lower-cased.
///
/// Applied at every boundary (extraction, upsert, lookup) so callers never
/// need to pre-normalize.
pub fn normalize_entity(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether `chunk_text` mentions `entity` as a case-insensitive substring.
///
/// This is the rule used to create `Chunk -ABOUT-> Entity` edges.
pub fn mentions(chunk_text: &str, entity: &str) -> bool {
    let needle = normalize_entity(entity);
    !needle.is_empty() && chunk_text.to_lowercase().contains(&needle)
}

/// Pluggable entity extraction capability.
///
/// Implementations return normalized, de-duplicated, sorted names. A model
/// backed extractor can replace [`HeuristicExtractor`] behind this trait.
pub trait EntityExtractor: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;
    /// Extract candidates from a set of texts.
    fn extract(&self, texts: &[&str]) -> Vec<String>;
}

/// Regex-based extractor; always available.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    fn collect_candidates(text: &str, out: &mut BTreeSet<String>) {
        for m in CAPITALIZED_RUN.find_iter(text) {
            let phrase = m.as_str();
            push_candidate(out, phrase);
            let parts: Vec<&str> = phrase.split_whitespace().collect();
            for idx in 1..parts.len() {
                push_candidate(out, &parts[idx..].join(" "));
            }
        }
        for m in LONG_WORD.find_iter(text) {
            push_candidate(out, m.as_str());
        }
    }
}

fn push_candidate(out: &mut BTreeSet<String>, candidate: &str) {
    let normalized = normalize_entity(candidate);
    if !normalized.is_empty() {
        out.insert(normalized);
    }
}

impl EntityExtractor for HeuristicExtractor {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn extract(&self, texts: &[&str]) -> Vec<String> {
        let mut candidates = BTreeSet::new();
        for text in texts {
            Self::collect_candidates(text, &mut candidates);
        }
        candidates.into_iter().collect()
    }
}

/// Extract entities with the default heuristic.
pub fn extract_entities<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    let refs: Vec<&str> = texts.iter().map(|t| t.as_ref()).collect();
    HeuristicExtractor.extract(&refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_capitalized_runs() {
        let entities = extract_entities(&[
            "Widget Alpha connects to Widget Beta.",
            "Ensure Alpha safety before Beta operations.",
        ]);
        assert!(entities.contains(&"widget alpha".to_string()));
        assert!(entities.contains(&"widget beta".to_string()));
        assert!(entities.len() >= 2);
    }

    #[test]
    fn test_right_aligned_subphrases() {
        let entities = extract_entities(&["Meet Alpha Widget Pro today"]);
        for expected in ["meet alpha widget pro", "alpha widget pro", "widget pro", "pro"] {
            assert!(entities.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(!entities.contains(&"alpha widget".to_string()));
    }

    #[test]
    fn test_long_words_included() {
        let entities = extract_entities(&["the patch goes out weekly via cron"]);
        assert!(entities.contains(&"patch".to_string()));
        assert!(entities.contains(&"weekly".to_string()));
        assert!(entities.contains(&"cron".to_string()));
        assert!(!entities.contains(&"the".to_string()));
        assert!(!entities.contains(&"via".to_string()));
    }

    #[test]
    fn test_sorted_deduplicated_lowercase() {
        let entities = extract_entities(&["Alpha alpha ALPHA Alpha"]);
        assert_eq!(entities, vec!["alpha".to_string()]);
        let many = extract_entities(&["Zeta Gamma beta Delta"]);
        let mut sorted = many.clone();
        sorted.sort();
        assert_eq!(many, sorted);
        assert!(many.iter().all(|e| *e == e.to_lowercase()));
    }

    #[test]
    fn test_deterministic() {
        let text = ["Service Desk escalations use ticket ABC-123 for Alpha systems."];
        assert_eq!(extract_entities(&text), extract_entities(&text));
    }

    #[test]
    fn test_no_candidates() {
        assert!(extract_entities(&["how do i fix it?"]).is_empty());
        assert!(extract_entities::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_normalize_and_mentions() {
        assert_eq!(normalize_entity("  Widget Alpha "), "widget alpha");
        assert!(mentions("The WIDGET ALPHA rollout", "widget alpha"));
        assert!(mentions("alphanumeric", "alpha"));
        assert!(!mentions("beta only", "alpha"));
        assert!(!mentions("anything", "   "));
    }
}
