//! PDF upload endpoint

use axum::{
    body::Bytes,
    extract::{multipart::Field, Multipart, State},
    Json,
};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use crate::error::Result;
use crate::ingestion::IngestOutcome;
use crate::server::state::AppState;
use crate::types::UploadResponse;

use super::ApiError;

/// Only content type accepted by the upload endpoint
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Detail returned for non-PDF uploads
pub const INVALID_FORMAT_DETAIL: &str = "Formato de arquivo inválido. Apenas PDFs são aceitos.";

/// Detail returned when the form has no `file` field
pub const MISSING_FILE_DETAIL: &str = "Nenhum arquivo enviado no campo 'file'.";

/// POST /upload - Store a PDF in Jarbas' memory
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Malformed multipart body: {}", e);
        ApiError::new(e.status(), format!("Corpo multipart inválido: {}", e))
    })? {
        if field.name() == Some("file") {
            return handle_file(&state, field).await;
        }
    }

    Err(ApiError::unprocessable(MISSING_FILE_DETAIL))
}

async fn handle_file(
    state: &AppState,
    field: Field<'_>,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    let filename = field.file_name().unwrap_or("upload.pdf").to_string();

    if field.content_type() != Some(PDF_CONTENT_TYPE) {
        tracing::warn!(
            "Rejected '{}' with content type {:?}",
            filename,
            field.content_type()
        );
        return Err(ApiError::bad_request(INVALID_FORMAT_DETAIL));
    }

    let data = field.bytes().await.map_err(|e| {
        tracing::error!("Failed to read upload '{}': {}", filename, e);
        ApiError::new(e.status(), format!("Erro ao processar o arquivo: {}", e))
    })?;

    tracing::info!("Received '{}' ({} bytes)", filename, data.len());

    match store_upload(state, &filename, data).await {
        Ok(outcome) => {
            tracing::info!("Finished '{}': {:?}", filename, outcome);
            Ok(Json(UploadResponse::success(filename)))
        }
        Err(e) => {
            tracing::error!("Failed to process '{}': {}", filename, e);
            Err(ApiError::internal(format!("Erro ao processar o arquivo: {}", e)))
        }
    }
}

/// Save the upload to a temp file, run the pipeline, remove the temp file
async fn store_upload(state: &AppState, filename: &str, data: Bytes) -> Result<IngestOutcome> {
    let upload_dir: PathBuf = state.config().server.upload_dir.clone();
    let temp = tokio::task::spawn_blocking(move || -> Result<NamedTempFile> {
        std::fs::create_dir_all(&upload_dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(&upload_dir)?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(file)
    })
    .await??;

    let outcome = state.pipeline().process_pdf(temp.path(), filename).await;

    if let Err(e) = temp.close() {
        tracing::warn!("Failed to remove temporary upload for '{}': {}", filename, e);
    }

    outcome
}
