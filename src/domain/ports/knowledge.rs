use crate::domain::errors::DomainError;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Article(String),
    /// The topic names several pages; candidates in source order.
    Ambiguous(Vec<String>),
    Missing,
}

/// Read-only encyclopedia lookup by topic.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    async fn summary(&self, topic: &str, sentences: usize) -> Result<Summary, DomainError>;
}
