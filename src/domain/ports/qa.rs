use crate::domain::errors::DomainError;
use async_trait::async_trait;

/// Extractive question answering: the answer is a span of `context`.
/// An empty string means the model found no span.
#[async_trait]
pub trait ExtractiveQa: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<String, DomainError>;
}
