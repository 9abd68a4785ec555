//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;

use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

use super::ApiError;

/// POST /query - Answer a question from the stored documents
pub async fn query(
    State(state): State<AppState>,
    body: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> std::result::Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!("Rejected query body: {}", rejection.body_text());
        ApiError::new(
            rejection.status(),
            format!("Requisição inválida: {}", rejection.body_text()),
        )
    })?;

    let start = Instant::now();
    tracing::info!("Query: \"{}\"", request.pergunta);

    match answer(&state, &request.pergunta).await {
        Ok(response) => {
            tracing::info!("Answered in {}ms", start.elapsed().as_millis());
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("Failed to answer \"{}\": {}", request.pergunta, e);
            Err(ApiError::internal(format!("Erro ao gerar a resposta: {}", e)))
        }
    }
}

async fn answer(state: &AppState, question: &str) -> Result<QueryResponse> {
    let top_k = state.config().retrieval.top_k;
    let results = state.knowledge().query_top_k(question, top_k).await?;

    let context = PromptBuilder::build_context(&results);
    if context.is_empty() {
        tracing::info!("No relevant chunks found");
        return Ok(QueryResponse::not_found());
    }
    tracing::debug!("Using {} chunks as context", results.len());

    let text = state.generator().generate(&context, question).await?;
    Ok(QueryResponse::new(text))
}
