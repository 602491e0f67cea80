//! Sliding-window word chunker.
//!
//! Splits raw text into overlapping [`TextChunk`]s bounded by a word count.
//! Words are whitespace-delimited tokens; they double as the token unit for
//! windowing, while [`approx_tokens`] gives the stored token estimate.
//!
//! # Algorithm
//!
//! 1. Split text on whitespace. No words means no chunks.
//! 2. Coerce parameters: `chunk_tokens <= 0` becomes [`DEFAULT_CHUNK_TOKENS`],
//!    negative overlap becomes `0`, and overlap `>= chunk_tokens` becomes
//!    `chunk_tokens / 2`.
//! 3. Emit windows of `chunk_tokens` words, advancing by
//!    `chunk_tokens - overlap` words. The final window is truncated to the
//!    remaining words and ends the loop.
//!
//! Chunk ids are provisional (`chunk-{ord}`); the ingestion pipeline
//! replaces them with `{doc_id}-{ord}`.
//!
//! # Example
//!
//! ```rust
//! use desk_copilot_core::chunk::split_text;
//!
//! let chunks = split_text("one two three four five six seven", 4, 1);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].text, "four five six seven");
//! ```

use serde::Serialize;

/// Window size used when the caller passes a non-positive size.
pub const DEFAULT_CHUNK_TOKENS: usize = 512;

/// Overlap used by the ingestion pipeline when none is configured.
pub const DEFAULT_CHUNK_OVERLAP: usize = 64;

/// Approximate characters-per-token ratio.
const CHARS_PER_TOKEN: usize = 4;

/// A provisional chunk produced by [`split_text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Provisional id, `chunk-{ord}`.
    pub id: String,
    /// Window words joined by single spaces.
    pub text: String,
    /// 0-based reading order.
    pub ord: usize,
    /// Number of words in this window.
    pub tokens: usize,
}

/// Deterministic token estimate: `max(word_count, ceil(char_count / 4))`.
///
/// Leading and trailing whitespace is ignored; blank text counts as `0`.
pub fn approx_tokens(text: &str) -> usize {
    let stripped = text.trim();
    if stripped.is_empty() {
        return 0;
    }
    let word_count = stripped.split_whitespace().count();
    let char_estimate = stripped.chars().count().div_ceil(CHARS_PER_TOKEN);
    word_count.max(char_estimate)
}

/// Apply the edge-case policy to raw window parameters.
///
/// Returns `(chunk_tokens, overlap_tokens)` with `overlap < chunk_tokens`
/// guaranteed, so the window always advances.
pub fn effective_params(chunk_tokens: i64, overlap_tokens: i64) -> (usize, usize) {
    let size = if chunk_tokens <= 0 {
        DEFAULT_CHUNK_TOKENS
    } else {
        chunk_tokens as usize
    };
    let overlap = overlap_tokens.max(0) as usize;
    let overlap = if overlap >= size { size / 2 } else { overlap };
    (size, overlap)
}

/// Split `text` into overlapping word windows.
///
/// Pure and restartable: identical input always yields identical output.
pub fn split_text(text: &str, chunk_tokens: i64, overlap_tokens: i64) -> Vec<TextChunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let (size, overlap) = effective_params(chunk_tokens, overlap_tokens);
    let step = size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut ord = 0usize;

    loop {
        let end = words.len().min(start + size);
        let window = &words[start..end];
        chunks.push(TextChunk {
            id: format!("chunk-{}", ord),
            text: window.join(" "),
            ord,
            tokens: window.len(),
        });
        if end == words.len() {
            break;
        }
        start += step;
        ord += 1;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_approx_tokens_deterministic() {
        assert_eq!(approx_tokens("hello"), approx_tokens("hello"));
        assert!(approx_tokens("hello world") >= 1);
    }

    #[test]
    fn test_approx_tokens_heuristic() {
        assert_eq!(approx_tokens(""), 0);
        assert_eq!(approx_tokens("   \n\t "), 0);
        // 10 chars -> ceil(10 / 4) = 3 beats 2 words
        assert_eq!(approx_tokens("short text"), 3);
        // 5 words of 1 char: 9 chars -> 3, words win
        assert_eq!(approx_tokens("a b c d e"), 5);
        assert_eq!(approx_tokens("  padded  "), 2);
    }

    #[test]
    fn test_empty_and_blank_input_yield_nothing() {
        assert!(split_text("", 10, 2).is_empty());
        assert!(split_text("  \n\t  ", 10, 2).is_empty());
    }

    #[test]
    fn test_respects_chunk_tokens() {
        let chunks = split_text("one two three four five six seven", 4, 1);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.tokens <= 4));
        assert!(chunks[0].text.starts_with("one"));
        assert_eq!(chunks[1].text.split_whitespace().next(), Some("four"));
    }

    #[test]
    fn test_short_input_single_chunk() {
        let chunks = split_text("short text", 512, 64);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "chunk-0");
        assert_eq!(chunks[0].ord, 0);
        assert_eq!(chunks[0].tokens, 2);
    }

    #[test]
    fn test_normalizes_whitespace() {
        let chunks = split_text("alpha\n\n  beta\tgamma", 10, 0);
        assert_eq!(chunks[0].text, "alpha beta gamma");
    }

    #[test]
    fn test_param_coercion() {
        assert_eq!(effective_params(0, 10), (DEFAULT_CHUNK_TOKENS, 10));
        assert_eq!(effective_params(-5, -1), (DEFAULT_CHUNK_TOKENS, 0));
        assert_eq!(effective_params(8, 8), (8, 4));
        assert_eq!(effective_params(8, 100), (8, 4));
        assert_eq!(effective_params(1, 1), (1, 0));
        assert_eq!(effective_params(10, 3), (10, 3));
    }

    #[test]
    fn test_pathological_overlap_terminates() {
        let text = (0..100).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = split_text(&text, 1, 50);
        assert_eq!(chunks.len(), 100);
        let chunks = split_text(&text, 2, 2);
        // overlap clamps to 1, step 1: windows start at 0..=98
        assert_eq!(chunks.len(), 99);
    }

    #[test]
    fn test_idempotent() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta iota kappa";
        assert_eq!(split_text(text, 3, 1), split_text(text, 3, 1));
    }

    #[test]
    fn test_ords_contiguous() {
        let text = (0..57).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = split_text(&text, 10, 3);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.ord, i);
            assert_eq!(c.id, format!("chunk-{}", i));
            assert!(!c.text.is_empty());
        }
    }

    #[test]
    fn test_coverage_reconstructs_word_sequence() {
        let text = (0..73).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        for (size, overlap) in [(1, 0), (5, 2), (10, 9), (7, 0), (200, 10)] {
            let chunks = split_text(&text, size, overlap);
            let (_, eff_overlap) = effective_params(size, overlap);
            let mut rebuilt: Vec<String> = Vec::new();
            for (i, c) in chunks.iter().enumerate() {
                let w = words(&c.text);
                let skip = if i == 0 { 0 } else { eff_overlap };
                rebuilt.extend(w.into_iter().skip(skip));
            }
            assert_eq!(rebuilt, words(&text), "size={} overlap={}", size, overlap);
        }
    }

    #[test]
    fn test_overlap_bound() {
        let text = (0..40).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let overlap = 3usize;
        let chunks = split_text(&text, 8, overlap as i64);
        for pair in chunks.windows(2) {
            let prev = words(&pair[0].text);
            let next = words(&pair[1].text);
            assert_eq!(&next[..overlap], &prev[prev.len() - overlap..]);
        }
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Überprüfung der Größe ┌──┐ naïve café";
        let chunks = split_text(text, 2, 0);
        assert_eq!(chunks.len(), 3);
        assert!(approx_tokens(text) >= 6);
    }
}
