//! Gemini providers over the Google Generative Language API
//!
//! Both providers share one HTTP client and authenticate with the API key in
//! the `x-goog-api-key` header. Every call is a single attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use crate::providers::embedding::EmbeddingProvider;
use crate::providers::llm::LlmProvider;

/// Maximum texts per `batchEmbedContents` request
const MAX_EMBED_BATCH: usize = 100;

/// Shared HTTP plumbing for the Gemini API
#[derive(Clone)]
pub struct GeminiApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiApi {
    /// Create from configuration
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL for a model method, e.g. `models/gemini-1.5-flash:generateContent`
    fn method_url(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model_path(model), method)
    }

    async fn post<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        decode_response(status, &text)
    }
}

/// Parse a reply body, turning non-success statuses into `Error::RemoteApi`
fn decode_response<Resp>(status: reqwest::StatusCode, text: &str) -> Result<Resp>
where
    Resp: for<'de> Deserialize<'de>,
{
    if !status.is_success() {
        return Err(Error::RemoteApi(describe_api_error(status, text)));
    }
    Ok(serde_json::from_str(text)?)
}

/// Prefix a bare model name with `models/`
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.status.is_empty() => format!(
            "Gemini API error ({} {}): {}",
            status, parsed.error.status, parsed.error.message
        ),
        Ok(parsed) => format!("Gemini API error ({}): {}", status, parsed.error.message),
        Err(_) => format!("Gemini API error ({}): {}", status, body),
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

// ============================================================================
// Embeddings
// ============================================================================

/// Embedding task hint sent with each request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: Content,
    task_type: TaskType,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini embedding provider
pub struct GeminiEmbedder {
    api: GeminiApi,
    model: String,
}

impl GeminiEmbedder {
    /// Create a new embedder
    pub fn new(api: GeminiApi, model: impl Into<String>) -> Self {
        Self {
            api,
            model: model_path(&model.into()),
        }
    }

    fn build_batch(&self, texts: &[String], task_type: TaskType) -> BatchEmbedRequest {
        BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: self.model.clone(),
                    content: Content {
                        role: None,
                        parts: vec![Part { text: text.clone() }],
                    },
                    task_type,
                })
                .collect(),
        }
    }

    async fn embed_with_task(&self, texts: &[String], task_type: TaskType) -> Result<Vec<Vec<f32>>> {
        let url = self.api.method_url(&self.model, "batchEmbedContents");
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_EMBED_BATCH) {
            let request = self.build_batch(batch, task_type);
            let response: BatchEmbedResponse = self
                .api
                .post(&url, &request)
                .await
                .map_err(|e| Error::embedding(e.to_string()))?;

            if response.embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Gemini returned {} embeddings for {} texts",
                    response.embeddings.len(),
                    batch.len()
                )));
            }

            all_embeddings.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(all_embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_with_task(texts, TaskType::RetrievalDocument).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_task(&[text.to_string()], TaskType::RetrievalQuery)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("No embedding in Gemini response"))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// Generation
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, all parts joined
    fn into_text(self) -> Result<String> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let candidate = match self.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                return Err(Error::llm(match block_reason {
                    Some(reason) => format!("Prompt blocked by Gemini: {}", reason),
                    None => "No candidates in Gemini response".to_string(),
                }))
            }
        };

        let finish_reason = candidate.finish_reason;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::llm(format!(
                "No text in Gemini response (finish reason: {})",
                finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

/// Gemini generation client
pub struct GeminiClient {
    api: GeminiApi,
    model: String,
}

impl GeminiClient {
    /// Create a new client
    pub fn new(api: GeminiApi, model: impl Into<String>) -> Self {
        Self {
            api,
            model: model.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = self.api.method_url(&self.model, "generateContent");
        let response: GenerateResponse = self
            .api
            .post(&url, &request)
            .await
            .map_err(|e| Error::llm(format!("Gemini request failed: {}", e)))?;
        response.into_text()
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
