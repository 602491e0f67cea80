//! Embedding capability trait, deterministic fallback embedder, and vector
//! utilities.
//!
//! Network-backed providers (OpenAI, Ollama, fastembed) live in the
//! `desk-copilot` app crate. The [`HashEmbedder`] here is the zero-dependency
//! fallback the ingestion pipeline substitutes when a provider fails.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Dimension of the fallback embedder when nothing else fixes it.
pub const DEFAULT_FALLBACK_DIMS: usize = 384;

/// Text-in / vector-out capability.
///
/// `embed` must return exactly one vector per input, in input order, each
/// of length [`dims`](Embedder::dims). Implementations fail loudly rather
/// than return malformed output; see [`validate_embeddings`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding dimensionality, or `0` if not known up front.
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a single text (e.g. a question).
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let vectors = embedder.embed(&[text.to_string()]).await?;
    validate_embeddings(&vectors, 1, embedder.dims())?;
    vectors
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))
}

/// Check that a provider response matches the request shape.
///
/// - exactly `expected` vectors;
/// - all vectors non-empty and of equal length;
/// - that length equals `dims` when `dims > 0`.
pub fn validate_embeddings(vectors: &[Vec<f32>], expected: usize, dims: usize) -> Result<()> {
    if vectors.len() != expected {
        bail!(
            "Embedding count mismatch: requested {}, received {}",
            expected,
            vectors.len()
        );
    }
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let width = first.len();
    if width == 0 {
        bail!("Embedding provider returned an empty vector");
    }
    if dims > 0 && width != dims {
        bail!("Embedding dimension mismatch: expected {}, received {}", dims, width);
    }
    if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != width) {
        bail!(
            "Embedding {} has dimension {}, expected {}",
            i,
            v.len(),
            width
        );
    }
    Ok(())
}

/// Deterministic, content-hashed pseudo-embeddings.
///
/// Each text's SHA-256 digest seeds a SplitMix64 stream; `dims` values in
/// `[-1, 1)` are drawn and L2-normalised. Identical text always yields the
/// identical vector. The vectors carry no semantics.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims: if dims == 0 { DEFAULT_FALLBACK_DIMS } else { dims },
        }
    }

    /// Embed one text synchronously.
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        let mut state = u64::from_le_bytes(seed);

        let mut vector: Vec<f32> = (0..self.dims)
            .map(|_| {
                let bits = splitmix64(&mut state) >> 11;
                let unit = bits as f64 / (1u64 << 53) as f64;
                (unit * 2.0 - 1.0) as f32
            })
            .collect();

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_DIMS)
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-stub"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Encode a float vector as little-endian f32 bytes.
///
/// ```rust
/// use desk_copilot_core::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode bytes written by [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or
/// zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_hash_embedder_deterministic_and_normalized() {
        let e = HashEmbedder::new(16);
        let a = e.embed_one("Alpha systems are patched weekly.");
        let b = e.embed_one("Alpha systems are patched weekly.");
        let c = e.embed_one("Something else entirely.");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(a.iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    #[test]
    fn test_hash_embedder_zero_dims_defaults() {
        assert_eq!(HashEmbedder::new(0).dims(), DEFAULT_FALLBACK_DIMS);
    }

    #[tokio::test]
    async fn test_hash_embedder_batch_order() {
        let e = HashEmbedder::new(8);
        let texts = vec!["one".to_string(), "two".to_string()];
        let out = e.embed(&texts).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], e.embed_one("one"));
        assert_eq!(out[1], e.embed_one("two"));
        let q = embed_query(&e, "two").await.unwrap();
        assert_eq!(q, out[1]);
    }

    #[test]
    fn test_validate_embeddings() {
        let ok = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        assert!(validate_embeddings(&ok, 2, 2).is_ok());
        assert!(validate_embeddings(&ok, 2, 0).is_ok());
        assert!(validate_embeddings(&ok, 3, 2).is_err());
        assert!(validate_embeddings(&ok, 2, 3).is_err());
        let ragged = vec![vec![0.1, 0.2], vec![0.3]];
        assert!(validate_embeddings(&ragged, 2, 0).is_err());
        assert!(validate_embeddings(&[vec![]], 1, 0).is_err());
        assert!(validate_embeddings(&[], 0, 4).is_ok());
    }

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }
}
