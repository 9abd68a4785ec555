//! Knowledge store over the embedding and vector store providers

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{EmbeddingProvider, VectorSearchResult, VectorStoreProvider};
use crate::types::Chunk;

/// Persistent chunk collection with semantic search.
///
/// Inserts embed chunk text with the document task type and queries embed the
/// question with the query task type, both through the same embedding provider.
#[derive(Clone)]
pub struct KnowledgeStore {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
}

impl KnowledgeStore {
    /// Create a new knowledge store
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { embedder, store }
    }

    /// Embed and store a document's chunks.
    ///
    /// Returns the number of records written. Ids already in the collection
    /// are left untouched and logged.
    pub async fn insert(&self, document_id: &str, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        tracing::debug!(
            "Embedded {} chunks of '{}' with {}",
            embeddings.len(),
            document_id,
            self.embedder.name()
        );

        let outcome = self.store.add(chunks, &embeddings).await?;
        if !outcome.skipped.is_empty() {
            tracing::warn!(
                "'{}': {} chunk ids already stored, kept previous content: {:?}",
                document_id,
                outcome.skipped.len(),
                outcome.skipped
            );
        }

        Ok(outcome.inserted)
    }

    /// Up to `top_k` chunks most similar to the question, best first.
    ///
    /// An empty collection returns nothing without calling the embedder.
    pub async fn query_top_k(&self, question: &str, top_k: usize) -> Result<Vec<VectorSearchResult>> {
        if self.store.is_empty().await? {
            tracing::debug!("Collection is empty, skipping search");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(question).await?;
        self.store.search(&query_embedding, top_k).await
    }

    /// Number of records in the collection
    pub async fn count(&self) -> Result<usize> {
        self.store.len().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::lance::tests::temp_store;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: counts of a few marker letters
    #[derive(Default)]
    pub(crate) struct LetterEmbedder {
        pub(crate) query_calls: AtomicUsize,
        pub(crate) document_calls: AtomicUsize,
        pub(crate) fail: bool,
    }

    pub(crate) const LETTER_DIMENSIONS: usize = 4;

    pub(crate) fn letter_vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        ['a', 'b', 'g', 'd']
            .iter()
            .map(|c| lower.matches(*c).count() as f32 + 0.01)
            .collect()
    }

    #[async_trait]
    impl EmbeddingProvider for LetterEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.document_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::embedding("embedding service unavailable"));
            }
            Ok(texts.iter().map(|t| letter_vector(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::embedding("embedding service unavailable"));
            }
            Ok(letter_vector(text))
        }

        fn name(&self) -> &str {
            "letters"
        }
    }

    /// Empty collection sized for `LetterEmbedder`
    pub(crate) async fn empty_store() -> (tempfile::TempDir, Arc<dyn VectorStoreProvider>) {
        let (dir, store) = temp_store(LETTER_DIMENSIONS).await;
        let store: Arc<dyn VectorStoreProvider> = store;
        (dir, store)
    }

    #[tokio::test]
    async fn test_empty_store_skips_embedding() {
        let embedder = Arc::new(LetterEmbedder::default());
        let (_dir, store) = empty_store().await;
        let knowledge = KnowledgeStore::new(embedder.clone(), store);

        let results = knowledge.query_top_k("anything?", 3).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.query_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_insert_then_query() {
        let embedder = Arc::new(LetterEmbedder::default());
        let (_dir, store) = empty_store().await;
        let knowledge = KnowledgeStore::new(embedder.clone(), store);

        let chunks = vec![
            Chunk::new("report.pdf", 0, "aaaa"),
            Chunk::new("report.pdf", 1, "bbbb"),
            Chunk::new("report.pdf", 2, "gggg"),
            Chunk::new("report.pdf", 3, "dddd"),
        ];
        assert_eq!(knowledge.insert("report.pdf", &chunks).await.unwrap(), 4);
        assert_eq!(knowledge.count().await.unwrap(), 4);

        let results = knowledge.query_top_k("bb", 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.content, "bbbb");
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert_eq!(embedder.query_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reinsert_keeps_first_write() {
        let (_dir, store) = empty_store().await;
        let knowledge = KnowledgeStore::new(Arc::new(LetterEmbedder::default()), store);

        knowledge
            .insert("report.pdf", &[Chunk::new("report.pdf", 0, "first")])
            .await
            .unwrap();
        let written = knowledge
            .insert("report.pdf", &[Chunk::new("report.pdf", 0, "second")])
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(knowledge.count().await.unwrap(), 1);
        let results = knowledge.query_top_k("first", 1).await.unwrap();
        assert_eq!(results[0].chunk.content, "first");
    }

    #[tokio::test]
    async fn test_embedding_failure_stores_nothing() {
        let embedder = Arc::new(LetterEmbedder {
            fail: true,
            ..Default::default()
        });
        let (_dir, store) = empty_store().await;
        let knowledge = KnowledgeStore::new(embedder, store);

        let err = knowledge
            .insert("report.pdf", &[Chunk::new("report.pdf", 0, "Alpha.")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(knowledge.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_empty_is_noop() {
        let embedder = Arc::new(LetterEmbedder::default());
        let (_dir, store) = empty_store().await;
        let knowledge = KnowledgeStore::new(embedder.clone(), store);
        assert_eq!(knowledge.insert("empty.pdf", &[]).await.unwrap(), 0);
        assert_eq!(embedder.document_calls.load(Ordering::SeqCst), 0);
    }
}
