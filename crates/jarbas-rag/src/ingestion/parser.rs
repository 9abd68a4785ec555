//! PDF text extraction

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::error::{Error, Result};

/// Turns a document on disk into plain text
///
/// Implementations:
/// - `PdfExtractor`: pdf-extract with a page-walking lopdf fallback
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of the document at `path`.
    ///
    /// Returns an empty string when the document has no extractable text.
    fn extract(&self, path: &Path) -> Result<String>;

    /// Get extractor name for logging
    fn name(&self) -> &str;
}

/// PDF extractor returning per-page text concatenated in page order
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of each page, in page order
    pub fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let filename = display_name(path);
        let data = std::fs::read(path)
            .map_err(|e| Error::file_parse(&filename, format!("Failed to read PDF: {}", e)))?;

        // pdf-extract can panic on unusual fonts
        let primary = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&data)
        }));

        match primary {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed on '{}': {}, trying fallback", filename, e);
                Self::extract_pages_fallback(&filename, &data)
            }
            Err(_) => {
                tracing::warn!("pdf-extract panicked on '{}', trying fallback", filename);
                Self::extract_pages_fallback(&filename, &data)
            }
        }
    }

    /// Fallback extraction walking pages with lopdf
    fn extract_pages_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::debug!("No text on page {} of '{}': {}", page_number, filename, e);
                    pages.push(String::new());
                }
            }
        }

        Ok(pages)
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let pages = self.extract_pages(path)?;
        tracing::debug!("Extracted {} pages from '{}'", pages.len(), display_name(path));
        Ok(join_pages(&pages))
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

/// Concatenate page texts in order, with no separator between pages
pub fn join_pages(pages: &[String]) -> String {
    pages.concat()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
