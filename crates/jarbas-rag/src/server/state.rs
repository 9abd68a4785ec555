//! Application state for the Jarbas server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::ingestion::{IngestPipeline, PdfExtractor, TextExtractor};
use crate::providers::{
    EmbeddingProvider, GeminiApi, GeminiClient, GeminiEmbedder, LanceVectorStore, LlmProvider,
    VectorStoreProvider,
};
use crate::retrieval::KnowledgeStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Upload pipeline (extract, chunk, store)
    pipeline: IngestPipeline,
    /// Knowledge store shared by upload and query
    knowledge: KnowledgeStore,
    /// Answer generator
    generator: AnswerGenerator,
    /// Set once the listener is bound
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state with the Gemini providers and the on-disk collection
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing Jarbas application state...");

        tokio::fs::create_dir_all(&config.server.upload_dir).await?;
        tracing::info!("Upload directory: {}", config.server.upload_dir.display());

        let vector_store = LanceVectorStore::from_config(&config.vector_db).await?;
        tracing::info!(
            "Collection '{}' holds {} records",
            config.vector_db.collection,
            vector_store.len().await?
        );

        let api = GeminiApi::new(&config.gemini);
        let embedder = GeminiEmbedder::new(api.clone(), config.gemini.embedding_model.clone());
        let llm = GeminiClient::new(api, config.gemini.generation_model.clone());
        tracing::info!(
            "Gemini providers initialized (embedding: {}, generation: {})",
            config.gemini.embedding_model,
            config.gemini.generation_model
        );

        Ok(Self::from_parts(
            config,
            Arc::new(PdfExtractor::new()),
            Arc::new(embedder),
            Arc::new(vector_store),
            Arc::new(llm),
        ))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: RagConfig,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let knowledge = KnowledgeStore::new(embedder, vector_store);
        let pipeline = IngestPipeline::new(extractor, knowledge.clone());
        let generator = AnswerGenerator::new(llm);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                knowledge,
                generator,
                ready: RwLock::new(false),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the upload pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    /// Get the knowledge store
    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.inner.knowledge
    }

    /// Get the answer generator
    pub fn generator(&self) -> &AnswerGenerator {
        &self.inner.generator
    }

    /// Check if the server is accepting requests and the collection answers
    pub async fn is_ready(&self) -> bool {
        let started = *self.inner.ready.read();
        if !started {
            return false;
        }
        match self.inner.knowledge.count().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Collection unavailable: {}", e);
                false
            }
        }
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
