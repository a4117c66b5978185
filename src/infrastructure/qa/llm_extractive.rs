use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{
    ports::{ExtractiveQa, LlmService},
    DomainError,
};

/// Extractive QA on top of a completion model: the model is told to quote
/// the shortest span of the context that answers the question.
pub struct LlmExtractiveQa {
    llm: Arc<dyn LlmService>,
    system_prompt: String,
}

impl LlmExtractiveQa {
    pub fn new(llm: Arc<dyn LlmService>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    fn build_prompt(question: &str, context: &str) -> String {
        format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer span:")
    }
}

/// Strips wrapping quotes and a trailing full stop the model tends to add.
fn clean_span(raw: &str) -> String {
    let span = raw.trim();
    let span = span
        .strip_prefix("Answer span:")
        .map(str::trim)
        .unwrap_or(span);
    let span = span.trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
    span.strip_suffix('.').unwrap_or(span).trim().to_string()
}

#[async_trait]
impl ExtractiveQa for LlmExtractiveQa {
    async fn answer(&self, question: &str, context: &str) -> Result<String, DomainError> {
        if context.trim().is_empty() {
            return Ok(String::new());
        }

        let raw = self
            .llm
            .complete_with_system(&self.system_prompt, &Self::build_prompt(question, context))
            .await?;
        Ok(clean_span(&raw))
    }
}
