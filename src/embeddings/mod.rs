// Embeddings module
// The `Embedder` capability plus the Ollama-backed and in-process hashing implementations

pub mod hash;
pub mod ollama;

#[cfg(test)]
mod tests;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::{RagError, Result};

pub use hash::HashEmbedder;
pub use ollama::OllamaClient;

/// Turns text into fixed-length vectors
///
/// Every vector produced by one embedder has the same length, and `embed_batch`
/// returns exactly one vector per input, in input order.
pub trait Embedder: Send + Sync {
    /// Short identifier used in logs and status output
    fn name(&self) -> &str;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| {
            RagError::Embedding(format!("{} returned no embedding", self.name()))
        })
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }
}

/// Construct the embedder selected in the configuration
#[inline]
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.backend {
        EmbeddingBackend::Ollama => {
            let client = OllamaClient::new(&config.ollama)
                .map_err(|e| RagError::Embedding(format!("{e:#}")))?;
            Ok(Box::new(client))
        }
        EmbeddingBackend::Hash => Ok(Box::new(HashEmbedder::new(config.hash_dimension))),
    }
}
