//! LanceDB-backed vector store
//!
//! One table per collection inside the storage directory. Rows carry the
//! chunk text and metadata next to a fixed-size embedding column; search is
//! LanceDB's cosine nearest-neighbour query.

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator,
    StringArray, UInt32Array,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

use super::vector_store::{AddOutcome, VectorSearchResult, VectorStoreProvider};

const VECTOR_COLUMN: &str = "vector";
const DISTANCE_COLUMN: &str = "_distance";

/// Arrow schema of a collection table
fn collection_schema(dimensions: usize) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("document_id", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("document", DataType::Utf8, false),
        Field::new("created_at", DataType::Int64, false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimensions as i32,
            ),
            false,
        ),
    ]))
}

/// Embedding width declared by an existing table
fn table_dimensions(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
        DataType::FixedSizeList(_, size) => Some(*size as usize),
        _ => None,
    }
}

/// SQL string literal for a LanceDB filter
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Persistent named collection stored with LanceDB
pub struct LanceVectorStore {
    _conn: Connection,
    table: Table,
    collection: String,
    dimensions: usize,
    // Check-then-add for existing ids must not interleave
    write_lock: tokio::sync::Mutex<()>,
}

impl LanceVectorStore {
    /// Open the collection table under `path`, creating it when missing.
    ///
    /// An existing table built for another embedding width is refused.
    pub async fn open(path: &Path, collection: &str, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("Embedding dimensions must be at least 1"));
        }
        tokio::fs::create_dir_all(path).await?;

        let uri = path.to_string_lossy();
        let conn = lancedb::connect(&uri).execute().await?;

        let existing = conn.table_names().execute().await?;
        let table = if existing.iter().any(|name| name == collection) {
            let table = conn.open_table(collection).execute().await?;
            let schema = table.schema().await?;
            match table_dimensions(&schema) {
                Some(found) if found == dimensions => {}
                found => {
                    return Err(Error::vector_db(format!(
                        "Collection '{}' stores {:?}-dimensional vectors, configured for {}",
                        collection, found, dimensions
                    )))
                }
            }
            table
        } else {
            tracing::info!("Creating collection '{}' ({} dimensions)", collection, dimensions);
            conn.create_empty_table(collection, collection_schema(dimensions))
                .execute()
                .await?
        };

        Ok(Self {
            _conn: conn,
            table,
            collection: collection.to_string(),
            dimensions,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Open the collection described by the config
    pub async fn from_config(config: &VectorDbConfig) -> Result<Self> {
        let store = Self::open(&config.storage_path, &config.collection, config.dimensions).await?;
        tracing::info!(
            "Opened collection '{}' at {}",
            config.collection,
            config.storage_path.display()
        );
        Ok(store)
    }

    /// Collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embedding width of the collection
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Fetch one record by id
    pub async fn get(&self, id: &str) -> Result<Option<Chunk>> {
        let chunks = self.scan(&format!("id = {}", quote(id))).await?;
        Ok(chunks.into_iter().next())
    }

    /// Ids stored for a document, in chunk order
    pub async fn ids_for_document(&self, document_id: &str) -> Result<Vec<String>> {
        let mut chunks = self
            .scan(&format!("document_id = {}", quote(document_id)))
            .await?;
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks.into_iter().map(|c| c.id).collect())
    }

    fn check_dimensions(&self, vector: &[f32], what: &str) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "{} has {} dimensions, collection '{}' expects {}",
                what,
                vector.len(),
                self.collection,
                self.dimensions
            )));
        }
        Ok(())
    }

    async fn scan(&self, filter: &str) -> Result<Vec<Chunk>> {
        // Plain queries are capped by a default limit otherwise
        let total = self.table.count_rows(None).await?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .only_if(filter)
            .limit(total)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut chunks = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                chunks.push(batch_to_chunk(batch, row)?);
            }
        }
        Ok(chunks)
    }

    /// Ids from `ids` that are already stored
    async fn existing_ids(&self, ids: &[&str]) -> Result<HashSet<String>> {
        let list: Vec<String> = ids.iter().map(|id| quote(id)).collect();
        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .only_if(format!("id IN ({})", list.join(", ")))
            .limit(ids.len())
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut found = HashSet::new();
        for batch in &batches {
            let column = string_column(batch, "id")?;
            for row in 0..batch.num_rows() {
                found.insert(column.value(row).to_string());
            }
        }
        Ok(found)
    }

    fn to_batch(&self, rows: &[(&Chunk, &Vec<f32>)]) -> Result<RecordBatch> {
        let now = Utc::now().timestamp_millis();
        let ids = StringArray::from_iter_values(rows.iter().map(|(c, _)| c.id.as_str()));
        let document_ids =
            StringArray::from_iter_values(rows.iter().map(|(c, _)| c.document_id.as_str()));
        let indexes = UInt32Array::from_iter_values(rows.iter().map(|(c, _)| c.chunk_index));
        let documents = StringArray::from_iter_values(rows.iter().map(|(c, _)| c.content.as_str()));
        let created = Int64Array::from(vec![now; rows.len()]);

        let flat: Vec<f32> = rows.iter().flat_map(|(_, v)| v.iter().copied()).collect();
        let item = Arc::new(Field::new("item", DataType::Float32, true));
        let vectors = FixedSizeListArray::try_new(
            item,
            self.dimensions as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        )?;

        Ok(RecordBatch::try_new(
            collection_schema(self.dimensions),
            vec![
                Arc::new(ids),
                Arc::new(document_ids),
                Arc::new(indexes),
                Arc::new(documents),
                Arc::new(created),
                Arc::new(vectors),
            ],
        )?)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::vector_db(format!("Missing column '{}'", name)))
}

fn batch_to_chunk(batch: &RecordBatch, row: usize) -> Result<Chunk> {
    let chunk_index = batch
        .column_by_name("chunk_index")
        .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
        .map(|a| a.value(row))
        .ok_or_else(|| Error::vector_db("Missing column 'chunk_index'"))?;

    Ok(Chunk {
        id: string_column(batch, "id")?.value(row).to_string(),
        document_id: string_column(batch, "document_id")?.value(row).to_string(),
        chunk_index,
        content: string_column(batch, "document")?.value(row).to_string(),
    })
}

#[async_trait]
impl VectorStoreProvider for LanceVectorStore {
    async fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<AddOutcome> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "Got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(AddOutcome::default());
        }
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            self.check_dimensions(embedding, &format!("Embedding for '{}'", chunk.id))?;
        }

        let _guard = self.write_lock.lock().await;

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        let mut seen = self.existing_ids(&ids).await?;

        let mut outcome = AddOutcome::default();
        let mut rows = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            // Also covers duplicates inside the same batch
            if seen.insert(chunk.id.clone()) {
                rows.push((chunk, embedding));
            } else {
                outcome.skipped.push(chunk.id.clone());
            }
        }

        if !rows.is_empty() {
            let batch = self.to_batch(&rows)?;
            let schema = batch.schema();
            let reader = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema);
            self.table.add(Box::new(reader)).execute().await?;
            outcome.inserted = rows.len();
        }

        tracing::debug!(
            "Collection '{}': {} added, {} skipped",
            self.collection,
            outcome.inserted,
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        self.check_dimensions(query_embedding, "Query embedding")?;
        if top_k == 0 || self.len().await? == 0 {
            return Ok(Vec::new());
        }

        let batches: Vec<RecordBatch> = self
            .table
            .vector_search(query_embedding.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut results = Vec::new();
        for batch in &batches {
            let distances = batch
                .column_by_name(DISTANCE_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| Error::vector_db("Search result has no distance column"))?;
            for row in 0..batch.num_rows() {
                results.push(VectorSearchResult {
                    chunk: batch_to_chunk(batch, row)?,
                    similarity: 1.0 - distances.value(row),
                });
            }
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.table.count_rows(None).await?)
    }

    fn name(&self) -> &str {
        "lancedb"
    }
}
