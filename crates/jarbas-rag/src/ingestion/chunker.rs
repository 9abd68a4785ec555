//! Paragraph chunking on blank-line boundaries

use crate::types::Chunk;

/// Paragraph separator
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Splits text into paragraph chunks.
///
/// Pieces are separated by `"\n\n"`; pieces that are empty or whitespace-only
/// are dropped and the rest keep their original text and order. There is no
/// size cap, so a single paragraph can be arbitrarily large.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParagraphChunker;

impl ParagraphChunker {
    /// Create a new chunker
    pub fn new() -> Self {
        Self
    }

    /// Split text into ordered, non-blank pieces
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split(PARAGRAPH_BREAK)
            .filter(|piece| !piece.trim().is_empty())
            .collect()
    }

    /// Chunk a document's text, assigning `{document_id}_{i}` identifiers
    pub fn chunk_document(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Chunk::new(document_id, i as u32, piece))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paragraphs() {
        let chunker = ParagraphChunker::new();
        assert_eq!(chunker.split("Alpha.\n\nBeta."), vec!["Alpha.", "Beta."]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        let chunker = ParagraphChunker::new();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   ").is_empty());
        assert!(chunker.split("\n\n\n\n  \n\n\t").is_empty());
    }

    #[test]
    fn test_blank_pieces_dropped_order_kept() {
        let chunker = ParagraphChunker::new();
        let text = "First\n\n   \n\nSecond line one\nSecond line two\n\n\n\nThird";
        let pieces = chunker.split(text);

        assert_eq!(pieces, vec!["First", "Second line one\nSecond line two", "Third"]);
        assert!(pieces.iter().all(|p| !p.trim().is_empty()));
    }

    #[test]
    fn test_pieces_keep_surrounding_whitespace() {
        let chunker = ParagraphChunker::new();
        // Only the "\n\n" boundaries are consumed
        assert_eq!(chunker.split("  Alpha \n\n\nBeta"), vec!["  Alpha ", "\nBeta"]);
    }

    #[test]
    fn test_single_newlines_do_not_split() {
        let chunker = ParagraphChunker::new();
        assert_eq!(chunker.split("a\nb\nc").len(), 1);
    }

    #[test]
    fn test_chunk_document_ids() {
        let chunker = ParagraphChunker::new();
        let chunks = chunker.chunk_document("report.pdf", "Alpha.\n\nBeta.");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "report.pdf_0");
        assert_eq!(chunks[0].content, "Alpha.");
        assert_eq!(chunks[1].id, "report.pdf_1");
        assert_eq!(chunks[1].content, "Beta.");
    }

    #[test]
    fn test_no_size_cap() {
        let chunker = ParagraphChunker::new();
        let long = "word ".repeat(10_000);
        let pieces = chunker.split(&long);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].len(), long.len());
    }
}
