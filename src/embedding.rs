//! Embedding capability consumed by the similarity scorer.
//!
//! The resolver never constructs a provider itself: callers inject one through
//! [`EmbeddingProvider`]. Vectors are fetched once per build in a single batch
//! ([`MentionVectors::fetch`]); any failure only disables the vector signal
//! for the affected mentions.

use std::collections::HashMap;

use crate::error::EmbeddingError;
use crate::similarity::normalize;

/// Result type for embedding operations.
pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

/// A text embedding backend.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed many texts, returning one vector per input in order.
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Cosine similarity in [-1, 1].
    fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }
}

/// Cosine similarity of two dense vectors.
///
/// Returns 0.0 for mismatched lengths or when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Per-mention vectors for one build, indexed like the mentions they came from.
#[derive(Debug, Clone, Default)]
pub struct MentionVectors {
    vectors: Vec<Option<Vec<f32>>>,
}

impl MentionVectors {
    /// Embed every distinct text once.
    ///
    /// Tries one `embed_batch` call first. If the batch fails (or returns the
    /// wrong number of vectors) each text is retried with `embed`; texts that
    /// still fail get no vector.
    pub fn fetch(provider: &dyn EmbeddingProvider, texts: &[&str]) -> Self {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut distinct: Vec<&str> = Vec::new();
        let slot_of: Vec<usize> = texts
            .iter()
            .map(|&t| {
                *slots.entry(t).or_insert_with(|| {
                    distinct.push(t);
                    distinct.len() - 1
                })
            })
            .collect();

        let embedded: Vec<Option<Vec<f32>>> = match provider.embed_batch(&distinct) {
            Ok(vecs) if vecs.len() == distinct.len() => vecs.into_iter().map(Some).collect(),
            Ok(vecs) => {
                let err = EmbeddingError::BatchLength {
                    expected: distinct.len(),
                    actual: vecs.len(),
                };
                tracing::warn!(error = %err, "embedding batch rejected, retrying per text");
                Self::embed_each(provider, &distinct)
            }
            Err(e) => {
                tracing::warn!(error = %e, "embedding batch failed, retrying per text");
                Self::embed_each(provider, &distinct)
            }
        };

        let vectors = slot_of.into_iter().map(|s| embedded[s].clone()).collect();
        Self { vectors }
    }

    fn embed_each(provider: &dyn EmbeddingProvider, texts: &[&str]) -> Vec<Option<Vec<f32>>> {
        let mut failures = 0usize;
        let out: Vec<Option<Vec<f32>>> = texts
            .iter()
            .map(|t| match provider.embed(t) {
                Ok(v) => Some(v),
                Err(e) => {
                    failures += 1;
                    tracing::debug!(error = %e, text = *t, "embedding failed");
                    None
                }
            })
            .collect();
        if failures > 0 {
            tracing::warn!(
                failures,
                total = texts.len(),
                "vector similarity disabled for mentions without embeddings"
            );
        }
        out
    }

    /// The vector for mention `index`, if one was obtained.
    pub fn get(&self, index: usize) -> Option<&[f32]> {
        self.vectors.get(index).and_then(|v| v.as_deref())
    }

    /// Number of mentions with a usable vector.
    pub fn available(&self) -> usize {
        self.vectors.iter().filter(|v| v.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Deterministic local embedder over hashed character trigrams.
///
/// No model, no network: useful for debugging runs and tests where a real
/// provider is not wired in. Texts are normalized the same way the lexical
/// signals normalize them.
#[derive(Debug, Clone)]
pub struct NgramEmbedder {
    dim: usize,
}

impl NgramEmbedder {
    pub const DEFAULT_DIM: usize = 256;

    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Default for NgramEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIM)
    }
}

impl EmbeddingProvider for NgramEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let padded: Vec<char> = format!("  {}  ", normalize(text)).chars().collect();
        let mut v = vec![0.0f32; self.dim];
        for window in padded.windows(3) {
            let slot = (fnv1a(window) % self.dim as u64) as usize;
            v[slot] += 1.0;
        }
        Ok(v)
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &c in chars {
        for b in (c as u32).to_le_bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}
