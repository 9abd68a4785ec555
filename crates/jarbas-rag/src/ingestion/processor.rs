//! Ingestion pipeline: extract, chunk, store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::retrieval::KnowledgeStore;

use super::chunker::ParagraphChunker;
use super::parser::TextExtractor;

/// What happened to an ingested document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Chunks were embedded and written; holds the number of new records
    Stored(usize),
    /// Extraction produced no text
    NoText,
    /// Text was present but yielded no non-blank paragraph
    NoChunks,
}

/// Pipeline turning an uploaded file into stored chunks
#[derive(Clone)]
pub struct IngestPipeline {
    extractor: Arc<dyn TextExtractor>,
    chunker: ParagraphChunker,
    knowledge: KnowledgeStore,
}

impl IngestPipeline {
    /// Create a new pipeline
    pub fn new(extractor: Arc<dyn TextExtractor>, knowledge: KnowledgeStore) -> Self {
        Self {
            extractor,
            chunker: ParagraphChunker::new(),
            knowledge,
        }
    }

    /// Knowledge store the pipeline writes into
    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// Process a PDF saved at `path`, stored under `filename` as document id.
    ///
    /// Empty text and zero chunks are not errors: they are logged and the
    /// collection is left unchanged.
    pub async fn process_pdf(&self, path: &Path, filename: &str) -> Result<IngestOutcome> {
        tracing::info!("Processing '{}'", filename);

        // Extraction is CPU bound and may block on disk
        let extractor = self.extractor.clone();
        let owned_path: PathBuf = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&owned_path)).await??;

        if text.trim().is_empty() {
            tracing::warn!("No text extracted from '{}'", filename);
            return Ok(IngestOutcome::NoText);
        }
        tracing::info!(
            "Extracted {} characters from '{}' with {}",
            text.chars().count(),
            filename,
            self.extractor.name()
        );

        let chunks = self.chunker.chunk_document(filename, &text);
        if chunks.is_empty() {
            tracing::warn!("No chunks produced for '{}'", filename);
            return Ok(IngestOutcome::NoChunks);
        }
        tracing::info!("Split '{}' into {} chunks", filename, chunks.len());

        let stored = self.knowledge.insert(filename, &chunks).await?;
        match self.knowledge.count().await {
            Ok(total) => tracing::info!(
                "Stored {} chunks of '{}' ({} records in collection)",
                stored,
                filename,
                total
            ),
            Err(e) => tracing::warn!(
                "Stored {} chunks of '{}', collection size unavailable: {}",
                stored,
                filename,
                e
            ),
        }

        Ok(IngestOutcome::Stored(stored))
    }
}
