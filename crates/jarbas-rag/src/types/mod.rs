//! Core types for the Jarbas service

pub mod document;
pub mod query;
pub mod response;

pub use document::Chunk;
pub use query::QueryRequest;
pub use response::{ErrorResponse, QueryResponse, StatusResponse, UploadResponse, NOT_FOUND_ANSWER};
