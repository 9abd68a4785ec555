//! Chunk type and the identifier convention for stored chunks

use serde::{Deserialize, Serialize};

/// A contiguous span of extracted document text, the unit of storage and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Store identifier: `{document_id}_{chunk_index}`
    pub id: String,
    /// Owning document (the uploaded filename)
    pub document_id: String,
    /// Position of the chunk within its document
    pub chunk_index: u32,
    /// Raw chunk text
    pub content: String,
}

impl Chunk {
    /// Create a chunk for position `chunk_index` of `document_id`
    pub fn new(document_id: impl Into<String>, chunk_index: u32, content: impl Into<String>) -> Self {
        let document_id = document_id.into();
        Self {
            id: Self::make_id(&document_id, chunk_index),
            document_id,
            chunk_index,
            content: content.into(),
        }
    }

    /// Build the store identifier for a chunk
    pub fn make_id(document_id: &str, chunk_index: u32) -> String {
        format!("{}_{}", document_id, chunk_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_convention() {
        let chunk = Chunk::new("report.pdf", 1, "Beta.");
        assert_eq!(chunk.id, "report.pdf_1");
        assert_eq!(chunk.document_id, "report.pdf");
        assert_eq!(chunk.chunk_index, 1);
    }

    #[test]
    fn test_make_id_keeps_filename_verbatim() {
        assert_eq!(Chunk::make_id("relatório final.pdf", 0), "relatório final.pdf_0");
    }
}
