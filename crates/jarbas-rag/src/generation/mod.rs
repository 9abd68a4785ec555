//! Grounded answer generation

pub mod answer;
pub mod prompt;

pub use answer::AnswerGenerator;
pub use prompt::{PromptBuilder, CONTEXT_SEPARATOR};
