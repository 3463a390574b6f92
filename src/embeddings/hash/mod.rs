
use tracing::debug;

use super::Embedder;
use crate::Result;

pub const DEFAULT_HASH_DIMENSION: usize = 256;

/// Deterministic embedder based on FNV-1a feature hashing
///
/// Word features (weight 1.0) and byte-bigram features (weight 0.5) are hashed
/// into a fixed number of buckets and the result is L2-normalised, so texts that
/// share words land close together under cosine distance. Needs no model and no
/// network, which makes it suitable for offline runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    #[inline]
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    #[inline]
    pub const fn dimension(&self) -> usize {
        self.dims
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dims];
        let lower = text.to_lowercase();

        for word in lower
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
        {
            embedding[self.bucket(word.as_bytes())] += 1.0;
        }

        for bigram in lower.as_bytes().windows(2) {
            embedding[self.bucket(bigram)] += 0.5;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }

    fn bucket(&self, bytes: &[u8]) -> usize {
        (fnv1a(bytes) % self.dims as u64) as usize
    }
}

impl Default for HashEmbedder {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    #[inline]
    fn name(&self) -> &str {
        "hash"
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(
            "Hashing {} texts into {} dimensions",
            texts.len(),
            self.dims
        );
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}
