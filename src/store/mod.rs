// Embedding store
// Embeds corpus chunks and keeps them in a persistent collection for similarity queries


use std::path::Path;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::database::{ChunkCollection, ChunkRecord, SearchHit, StoredChunk};
use crate::embeddings::Embedder;
use crate::{RagError, Result};

/// Chunks embedded per call to the embedder during ingest
pub const INGEST_BATCH_SIZE: usize = 32;

/// Anything that can answer "which stored texts are closest to this one"
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// At most `top_k` stored texts, most similar first
    async fn similarity_query(&self, text: &str, top_k: usize) -> Result<Vec<String>>;
}

/// Outcome of one ingest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks in the ingested corpus
    pub chunks: usize,
    /// Records in the collection afterwards
    pub records: usize,
}

/// A chunk collection paired with the embedder that fills and queries it
pub struct EmbeddingStore {
    collection: ChunkCollection,
    embedder: Box<dyn Embedder>,
}

impl EmbeddingStore {
    #[inline]
    pub async fn open(path: &Path, name: &str, embedder: Box<dyn Embedder>) -> Result<Self> {
        let collection = ChunkCollection::open(path, name).await?;
        Ok(Self::new(collection, embedder))
    }

    #[inline]
    pub fn new(collection: ChunkCollection, embedder: Box<dyn Embedder>) -> Self {
        Self {
            collection,
            embedder,
        }
    }

    #[inline]
    pub fn collection(&self) -> &ChunkCollection {
        &self.collection
    }

    #[inline]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Embed every chunk and write it under its ordinal
    ///
    /// Records left over from a previous, longer corpus are removed, so the
    /// collection always mirrors `corpus` exactly.
    #[inline]
    pub async fn ingest(&mut self, corpus: &Corpus) -> Result<IngestReport> {
        info!(
            "Ingesting {} chunks into {} with {}",
            corpus.len(),
            self.collection.name(),
            self.embedder.name()
        );

        let bar = progress_bar(corpus.len());
        let mut records = Vec::with_capacity(corpus.len());

        for (batch_index, batch) in corpus.chunks().chunks(INGEST_BATCH_SIZE).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            if vectors.len() != batch.len() {
                bar.abandon();
                return Err(RagError::Embedding(format!(
                    "{} returned {} embeddings for {} chunks",
                    self.embedder.name(),
                    vectors.len(),
                    batch.len()
                )));
            }

            let offset = batch_index * INGEST_BATCH_SIZE;
            for (position, (chunk, vector)) in batch.iter().zip(vectors).enumerate() {
                let ordinal = u32::try_from(offset + position)
                    .map_err(|_| RagError::Database("Corpus too large".to_string()))?;
                records.push(ChunkRecord::new(ordinal, chunk.kind.as_str(), &chunk.text, vector));
            }

            bar.inc(batch.len() as u64);
            debug!("Embedded batch {} ({} chunks)", batch_index, batch.len());
        }
        bar.finish_and_clear();

        self.collection.upsert(&records).await?;
        self.collection.prune_from(corpus.len()).await?;

        let report = IngestReport {
            chunks: corpus.len(),
            records: self.collection.count().await?,
        };
        info!(
            "Ingest complete: {} chunks, {} records stored",
            report.chunks, report.records
        );
        Ok(report)
    }

    /// Nearest stored chunks to `text`, closest first
    #[inline]
    pub async fn search(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if self.collection.count().await? == 0 {
            debug!("Collection {} is empty, skipping search", self.collection.name());
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(text)?;
        self.collection.search(&vector, top_k).await
    }

    /// Texts of the nearest stored chunks, closest first
    #[inline]
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<String>> {
        let hits = self.search(text, top_k).await?;
        Ok(hits.into_iter().map(|hit| hit.chunk.text).collect())
    }

    #[inline]
    pub async fn count(&self) -> Result<usize> {
        self.collection.count().await
    }

    #[inline]
    pub async fn list(&self) -> Result<Vec<StoredChunk>> {
        self.collection.list().await
    }
}

#[async_trait]
impl SimilaritySearch for EmbeddingStore {
    #[inline]
    async fn similarity_query(&self, text: &str, top_k: usize) -> Result<Vec<String>> {
        self.query(text, top_k).await
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    if len > 0 && console::user_attended_stderr() {
        let style = ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(len as u64).with_style(style)
    } else {
        ProgressBar::hidden()
    }
}
