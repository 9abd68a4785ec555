//! Response bodies for the HTTP API

use serde::{Deserialize, Serialize};

/// Answer returned when retrieval finds nothing to ground a reply on
pub const NOT_FOUND_ANSWER: &str =
    "Não encontrei informações relevantes nos documentos para responder a essa pergunta.";

/// Body of a `POST /query` reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer, or the canned not-found text
    pub resposta: String,
}

impl QueryResponse {
    /// Wrap a generated answer
    pub fn new(resposta: impl Into<String>) -> Self {
        Self {
            resposta: resposta.into(),
        }
    }

    /// Reply used when the store has nothing relevant
    pub fn not_found() -> Self {
        Self::new(NOT_FOUND_ANSWER)
    }
}

/// Body of a successful `POST /upload` reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub mensagem: String,
    pub nome_arquivo: String,
}

impl UploadResponse {
    /// Success reply for an uploaded file
    pub fn success(nome_arquivo: impl Into<String>) -> Self {
        Self {
            status: "sucesso".to_string(),
            mensagem: "Arquivo processado e memória do Jarbas atualizada.".to_string(),
            nome_arquivo: nome_arquivo.into(),
        }
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "Projeto")]
    pub projeto: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl Default for StatusResponse {
    fn default() -> Self {
        Self {
            projeto: "Jarbas".to_string(),
            status: "API Online".to_string(),
        }
    }
}

/// Error body shared by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
