//! jarbas-rag: a small retrieval-augmented question answering service
//!
//! PDFs uploaded over HTTP are split into paragraphs and stored with Gemini
//! embeddings in a persistent LanceDB collection. Questions retrieve the most
//! similar paragraphs and Gemini answers from that context only.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{Chunk, QueryRequest, QueryResponse, UploadResponse};
