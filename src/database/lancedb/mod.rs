// LanceDB vector database module
// Persistent chunk collection with similarity search

#[cfg(test)]
mod tests;

pub mod collection;

pub use collection::ChunkCollection;

use serde::{Deserialize, Serialize};

/// Record written to the collection for one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Ordinal rendered as a decimal string; the upsert key
    pub id: String,
    pub ordinal: u32,
    pub kind: String,
    pub text: String,
    pub vector: Vec<f32>,
}

impl ChunkRecord {
    #[inline]
    pub fn new(ordinal: u32, kind: &str, text: &str, vector: Vec<f32>) -> Self {
        Self {
            id: ordinal.to_string(),
            ordinal,
            kind: kind.to_string(),
            text: text.to_string(),
            vector,
        }
    }
}

/// A record read back from the collection, without its vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub ordinal: u32,
    pub kind: String,
    pub text: String,
}

/// Result of a similarity search, closest first
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: StoredChunk,
    /// Cosine distance to the query vector
    pub distance: f32,
}

impl SearchHit {
    /// Cosine similarity, higher is better
    #[inline]
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}
