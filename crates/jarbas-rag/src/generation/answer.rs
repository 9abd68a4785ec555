//! Answer generation from retrieved context

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;

use super::prompt::PromptBuilder;

/// Produces a grounded answer for a question and its context
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    /// Create a new generator
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate the answer text; one model call, no retries
    pub async fn generate(&self, context: &str, question: &str) -> Result<String> {
        let prompt = PromptBuilder::build_rag_prompt(question, context);
        tracing::debug!(
            "Generating answer with {} ({}), prompt {} chars",
            self.llm.name(),
            self.llm.model(),
            prompt.len()
        );
        self.llm.generate(&prompt).await
    }
}
