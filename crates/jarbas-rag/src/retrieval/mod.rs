//! Knowledge store: embeds chunks on insert and answers nearest-chunk queries

pub(crate) mod knowledge_store;

pub use knowledge_store::KnowledgeStore;
