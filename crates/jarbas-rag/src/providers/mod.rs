//! Provider abstractions for embeddings, generation, and vector storage
//!
//! The server talks to these traits only; the Gemini and LanceDB
//! implementations are wired up in `server::state`.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod lance;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiApi, GeminiClient, GeminiEmbedder};
pub use llm::LlmProvider;
pub use lance::LanceVectorStore;
pub use vector_store::{AddOutcome, VectorSearchResult, VectorStoreProvider};
