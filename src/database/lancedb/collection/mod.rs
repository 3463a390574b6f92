
use super::{ChunkRecord, SearchHit, StoredChunk};
use crate::{RagError, Result};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::table::Table;
use lancedb::{Connection, DistanceType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named LanceDB table of chunk records under a persist directory
///
/// The table is created on the first upsert, once the vector dimension is known.
pub struct ChunkCollection {
    connection: Connection,
    table_name: String,
    path: PathBuf,
    vector_dimension: Option<usize>,
}

impl ChunkCollection {
    /// Open or create the collection `name` stored under `path`
    #[inline]
    pub async fn open(path: &Path, name: &str) -> Result<Self> {
        debug!("Opening LanceDB collection {} at {}", name, path.display());

        std::fs::create_dir_all(path).map_err(|e| {
            RagError::StoreUnavailable(format!(
                "Failed to create vector store directory {}: {}",
                path.display(),
                e
            ))
        })?;

        let uri = path.to_string_lossy().into_owned();
        let connection = lancedb::connect(&uri).execute().await.map_err(|e| {
            RagError::StoreUnavailable(format!("Failed to connect to LanceDB at {}: {}", uri, e))
        })?;

        let mut collection = Self {
            connection,
            table_name: name.to_string(),
            path: path.to_path_buf(),
            vector_dimension: None,
        };

        if let Some(table) = collection.open_table().await? {
            let dimension = detect_vector_dimension(&table).await?;
            info!(
                "Opened existing collection {} with {} dimensions",
                collection.table_name, dimension
            );
            collection.vector_dimension = Some(dimension);
        } else {
            info!(
                "Collection {} does not exist yet, it will be created on first ingest",
                collection.table_name
            );
        }

        Ok(collection)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.table_name
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dimension of the stored vectors, `None` until the table exists
    #[inline]
    pub fn vector_dimension(&self) -> Option<usize> {
        self.vector_dimension
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::StoreUnavailable(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }

    async fn open_table(&self) -> Result<Option<Table>> {
        if !self.table_exists().await? {
            return Ok(None);
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| {
                RagError::StoreUnavailable(format!(
                    "Failed to open table {}: {}",
                    self.table_name, e
                ))
            })?;

        Ok(Some(table))
    }

    /// Insert records, overwriting any existing record with the same id
    ///
    /// If the vectors do not match the stored dimension the table is recreated,
    /// since vectors from different embedders cannot be compared.
    #[inline]
    pub async fn upsert(&mut self, records: &[ChunkRecord]) -> Result<()> {
        let Some(first) = records.first() else {
            debug!("No records to upsert");
            return Ok(());
        };

        let vector_dim = first.vector.len();
        if vector_dim == 0 {
            return Err(RagError::Embedding(
                "Embedder produced an empty vector".to_string(),
            ));
        }
        if let Some(record) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(RagError::Embedding(format!(
                "Inconsistent vector dimensions: record {} has {} values, expected {}",
                record.id,
                record.vector.len(),
                vector_dim
            )));
        }

        if self.vector_dimension != Some(vector_dim) {
            if let Some(previous) = self.vector_dimension {
                warn!(
                    "Vector dimension changed from {} to {}, recreating collection {}",
                    previous, vector_dim, self.table_name
                );
            }
            self.recreate_table(vector_dim).await?;
            self.vector_dimension = Some(vector_dim);
        }

        let table = self.open_table().await?.ok_or_else(|| {
            RagError::StoreUnavailable(format!("Table {} disappeared", self.table_name))
        })?;

        let record_batch = create_record_batch(records, vector_dim)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        let mut merge = table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge.execute(Box::new(reader)).await.map_err(|e| {
            RagError::StoreUnavailable(format!("Failed to upsert records: {}", e))
        })?;

        info!(
            "Upserted {} records into {}",
            records.len(),
            self.table_name
        );
        Ok(())
    }

    /// Delete every record whose ordinal is `ordinal` or higher
    #[inline]
    pub async fn prune_from(&self, ordinal: usize) -> Result<()> {
        let Some(table) = self.open_table().await? else {
            return Ok(());
        };

        debug!("Pruning records with ordinal >= {}", ordinal);
        table
            .delete(&format!("ordinal >= {}", ordinal))
            .await
            .map_err(|e| RagError::StoreUnavailable(format!("Failed to prune records: {}", e)))?;

        Ok(())
    }

    /// Nearest records to `query_vector` by cosine distance, closest first
    #[inline]
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let Some(table) = self.open_table().await? else {
            return Ok(Vec::new());
        };

        if limit == 0 || count_rows(&table).await? == 0 {
            return Ok(Vec::new());
        }

        if let Some(dimension) = self.vector_dimension {
            if dimension != query_vector.len() {
                return Err(RagError::Database(format!(
                    "Query vector has {} dimensions but collection {} stores {}; re-run ingest with the current embedder",
                    query_vector.len(),
                    self.table_name,
                    dimension
                )));
            }
        }

        let mut results = table
            .vector_search(query_vector)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to execute search: {}", e)))?;

        let mut hits = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read result stream: {}", e)))?
        {
            hits.extend(parse_search_batch(&batch)?);
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(limit);

        debug!("Found {} similar records", hits.len());
        Ok(hits)
    }

    /// Total number of records
    #[inline]
    pub async fn count(&self) -> Result<usize> {
        match self.open_table().await? {
            Some(table) => count_rows(&table).await,
            None => Ok(0),
        }
    }

    /// Every record, ordered by ordinal
    #[inline]
    pub async fn list(&self) -> Result<Vec<StoredChunk>> {
        let Some(table) = self.open_table().await? else {
            return Ok(Vec::new());
        };

        let total = count_rows(&table).await?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut results = table
            .query()
            .limit(total)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to query records: {}", e)))?;

        let mut chunks = Vec::with_capacity(total);
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read result stream: {}", e)))?
        {
            chunks.extend(parse_chunk_batch(&batch)?);
        }

        chunks.sort_by_key(|c| c.ordinal);
        Ok(chunks)
    }

    async fn recreate_table(&self, vector_dim: usize) -> Result<()> {
        if self.table_exists().await? {
            info!("Dropping collection {}", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| RagError::StoreUnavailable(format!("Failed to drop table: {}", e)))?;
        }

        self.connection
            .create_empty_table(&self.table_name, create_schema(vector_dim))
            .execute()
            .await
            .map_err(|e| RagError::StoreUnavailable(format!("Failed to create table: {}", e)))?;

        info!(
            "Created collection {} with {} dimensions",
            self.table_name, vector_dim
        );
        Ok(())
    }
}

fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("ordinal", DataType::UInt32, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dim as i32,
            ),
            false,
        ),
    ]))
}

async fn count_rows(table: &Table) -> Result<usize> {
    table
        .count_rows(None)
        .await
        .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))
}

async fn detect_vector_dimension(table: &Table) -> Result<usize> {
    let schema = table
        .schema()
        .await
        .map_err(|e| RagError::StoreUnavailable(format!("Failed to get table schema: {}", e)))?;

    schema
        .fields()
        .iter()
        .find(|field| field.name() == "vector")
        .and_then(|field| match field.data_type() {
            DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
            _ => None,
        })
        .ok_or_else(|| {
            RagError::StoreUnavailable(
                "Could not find vector column or determine dimension".to_string(),
            )
        })
}

fn create_record_batch(records: &[ChunkRecord], vector_dim: usize) -> Result<RecordBatch> {
    let len = records.len();

    let mut ids = Vec::with_capacity(len);
    let mut ordinals = Vec::with_capacity(len);
    let mut kinds = Vec::with_capacity(len);
    let mut texts = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * vector_dim);

    for record in records {
        ids.push(record.id.as_str());
        ordinals.push(record.ordinal);
        kinds.push(record.kind.as_str());
        texts.push(record.text.as_str());
        flat_values.extend_from_slice(&record.vector);
    }

    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array = FixedSizeListArray::try_new(
        field,
        vector_dim as i32,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .map_err(|e| RagError::Database(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(UInt32Array::from(ordinals)),
        Arc::new(StringArray::from(kinds)),
        Arc::new(StringArray::from(texts)),
        Arc::new(vector_array),
    ];

    RecordBatch::try_new(create_schema(vector_dim), arrays)
        .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Database(format!("Invalid {} column type", name)))
}

fn parse_chunk_batch(batch: &RecordBatch) -> Result<Vec<StoredChunk>> {
    let ids = string_column(batch, "id")?;
    let kinds = string_column(batch, "kind")?;
    let texts = string_column(batch, "text")?;
    let ordinals = batch
        .column_by_name("ordinal")
        .ok_or_else(|| RagError::Database("Missing ordinal column".to_string()))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| RagError::Database("Invalid ordinal column type".to_string()))?;

    Ok((0..batch.num_rows())
        .map(|row| StoredChunk {
            id: ids.value(row).to_string(),
            ordinal: ordinals.value(row),
            kind: kinds.value(row).to_string(),
            text: texts.value(row).to_string(),
        })
        .collect())
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
    let chunks = parse_chunk_batch(batch)?;

    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(row, chunk)| {
            let distance = distances
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });
            SearchHit { chunk, distance }
        })
        .collect())
}
