//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Chunk;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// Outcome of adding chunks to a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOutcome {
    /// Number of new records written
    pub inserted: usize,
    /// Ids that already existed and were left untouched
    pub skipped: Vec<String>,
}

/// Trait for a persistent chunk collection with similarity search
///
/// Implementations:
/// - `LanceVectorStore`: LanceDB table on local disk
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Add chunks with their embeddings (same length and order).
    ///
    /// Existing ids are not overwritten.
    async fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<AddOutcome>;

    /// Return up to `top_k` chunks, most similar first
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>>;

    /// Get total number of records stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
