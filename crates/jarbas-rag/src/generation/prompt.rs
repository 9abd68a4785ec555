//! Prompt templates for grounded answers

use crate::providers::vector_store::VectorSearchResult;

/// Separator placed between retrieved chunks in the context block
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts in ranking order
    pub fn build_context(results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Build the Jarbas prompt: answer only from the context, in Portuguese
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Você é o Jarbas, uma inteligência artificial assistente.
Sua tarefa é responder à pergunta do usuário de forma clara, objetiva e exclusivamente com base no contexto fornecido.
Não utilize nenhum conhecimento externo. Se a resposta não estiver no contexto, diga "A informação não foi encontrada nos documentos fornecidos."

**Contexto:**
{context}

**Pergunta do Usuário:**
{question}

**Sua Resposta:**
"#
        )
    }
}
