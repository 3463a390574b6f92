// Database module
// LanceDB-backed persistence for embedded chunks

pub mod lancedb;

pub use self::lancedb::{ChunkCollection, ChunkRecord, SearchHit, StoredChunk};
