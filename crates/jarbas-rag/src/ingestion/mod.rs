//! PDF ingestion: text extraction, paragraph chunking, storage

mod chunker;
pub(crate) mod parser;
pub(crate) mod processor;

pub use chunker::{ParagraphChunker, PARAGRAPH_BREAK};
pub use parser::{join_pages, PdfExtractor, TextExtractor};
pub use processor::{IngestOutcome, IngestPipeline};
