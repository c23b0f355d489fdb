//! Answer generation: prompt assembly and LLM completion

mod prompt;

pub use prompt::PromptBuilder;

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::retrieval::SearchResult;

/// Generates answers grounded in retrieved chunks
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    max_context_chars: usize,
}

impl AnswerGenerator {
    /// Create a generator bounding prompt context to `max_context_chars`
    pub fn new(llm: Arc<dyn LlmProvider>, max_context_chars: usize) -> Self {
        Self {
            llm,
            max_context_chars,
        }
    }

    /// Answer `question` from `results`, which must be in retrieval order
    pub async fn generate(&self, question: &str, results: &[SearchResult]) -> Result<String> {
        let context = PromptBuilder::build_context(results, self.max_context_chars);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);

        tracing::debug!(
            "Prompt for {} uses {} context chars",
            self.llm.model(),
            context.chars().count()
        );

        let answer = self.llm.generate(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}
