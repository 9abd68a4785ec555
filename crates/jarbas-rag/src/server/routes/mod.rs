//! API routes for the Jarbas server

pub mod query;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::{ErrorResponse, StatusResponse};

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Upload - with larger body limit for PDF files
        .route(
            "/upload",
            post(upload::upload_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::query))
}

/// GET / - Service status
async fn root() -> Json<StatusResponse> {
    Json(StatusResponse::default())
}

/// Error reply rendered as `{"detail": ...}`
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::RagConfig;
    use crate::generation::answer::tests::ScriptedLlm;
    use crate::ingestion::processor::tests::FixedExtractor;
    use crate::providers::lance::tests::temp_store;
    use crate::providers::LanceVectorStore;
    use crate::retrieval::knowledge_store::tests::{LetterEmbedder, LETTER_DIMENSIONS};
    use crate::server::build_router;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Router plus handles on every fake behind it
    pub(crate) struct Harness {
        pub(crate) state: AppState,
        pub(crate) extractor: Arc<FixedExtractor>,
        pub(crate) llm: Arc<ScriptedLlm>,
        pub(crate) db: Arc<LanceVectorStore>,
        pub(crate) upload_dir: tempfile::TempDir,
        _db_dir: tempfile::TempDir,
    }

    impl Harness {
        /// State marked ready, as after `RagServer::start` binds
        pub(crate) async fn new(text: &str, embedder: LetterEmbedder, llm: ScriptedLlm) -> Self {
            let upload_dir = tempfile::tempdir().unwrap();
            let mut config = RagConfig::default();
            config.server.upload_dir = upload_dir.path().to_path_buf();

            let extractor = Arc::new(FixedExtractor::new(text));
            let llm = Arc::new(llm);
            let (db_dir, db) = temp_store(LETTER_DIMENSIONS).await;
            let state = AppState::from_parts(
                config,
                extractor.clone(),
                Arc::new(embedder),
                db.clone(),
                llm.clone(),
            );
            state.set_ready(true);

            Self {
                state,
                extractor,
                llm,
                db,
                upload_dir,
                _db_dir: db_dir,
            }
        }

        pub(crate) async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
            let response = build_router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, json)
        }

        pub(crate) fn leftover_uploads(&self) -> usize {
            std::fs::read_dir(self.upload_dir.path()).unwrap().count()
        }
    }

    const BOUNDARY: &str = "jarbas-test-boundary";

    pub(crate) fn multipart_request(
        field: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    pub(crate) fn query_request(question: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "pergunta": question }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_status() {
        let harness = Harness::new("", LetterEmbedder::default(), ScriptedLlm::default()).await;
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = harness.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "Projeto": "Jarbas", "Status": "API Online" }));
    }

    async fn status_of(state: &AppState, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        build_router(state.clone()).oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health() {
        let harness = Harness::new("", LetterEmbedder::default(), ScriptedLlm::default()).await;
        assert_eq!(status_of(&harness.state, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_until_started() {
        let (_dir, store) = temp_store(LETTER_DIMENSIONS).await;
        let state = AppState::from_parts(
            RagConfig::default(),
            Arc::new(FixedExtractor::new("")),
            Arc::new(LetterEmbedder::default()),
            store,
            Arc::new(ScriptedLlm::default()),
        );

        assert_eq!(status_of(&state, "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
        state.set_ready(true);
        assert_eq!(status_of(&state, "/ready").await, StatusCode::OK);
        assert_eq!(status_of(&state, "/health").await, StatusCode::OK);
    }

    #[test]
    fn test_api_error_body() {
        let response = ApiError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
