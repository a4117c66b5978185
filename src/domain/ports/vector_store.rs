use crate::domain::{errors::DomainError, Embedding, Record, SearchResult};
use async_trait::async_trait;

/// Named collections of embedded records, queried by nearest neighbour.
///
/// Each collection owns a monotonic id sequence; `next_id` hands out
/// `0, 1, 2, ...` without reading the current size.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn ensure_collection(&self, collection: &str, dimension: usize)
        -> Result<(), DomainError>;
    async fn next_id(&self, collection: &str) -> Result<u64, DomainError>;
    async fn add(
        &self,
        collection: &str,
        record: &Record,
        embedding: &Embedding,
    ) -> Result<(), DomainError>;
    /// Closest records first.
    async fn query(
        &self,
        collection: &str,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
    async fn count(&self, collection: &str) -> Result<usize, DomainError>;
}
