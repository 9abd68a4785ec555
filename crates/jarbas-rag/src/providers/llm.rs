//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for single-turn text generation
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (gemini-1.5-flash)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the model's text verbatim
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
