use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DomainError, Embedding, Record, SearchResult,
};

/// Collection names for the two indexes the agent keeps.
#[derive(Debug, Clone)]
pub struct Collections {
    pub documents: String,
    pub history: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            documents: "document_collection".to_string(),
            history: "conversation_history".to_string(),
        }
    }
}

/// Shared retrieval context: one embedding model, one vector store handle and
/// the collections living in it. Everything that embeds or searches goes
/// through here so the embedding space stays consistent.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    collections: Collections,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        collections: Collections,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            collections,
        }
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// Creates both collections if they do not exist yet.
    #[instrument(skip(self))]
    pub async fn prepare(&self) -> Result<(), DomainError> {
        let dimension = self.embedding.dimension();
        self.vector_store
            .ensure_collection(&self.collections.documents, dimension)
            .await?;
        self.vector_store
            .ensure_collection(&self.collections.history, dimension)
            .await
    }

    pub async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embedding.embed(text).await
    }

    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        self.embedding.embed_batch(texts).await
    }

    #[instrument(skip(self, query))]
    pub async fn nearest(
        &self,
        collection: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        self.vector_store.query(collection, &embedding, top_k).await
    }

    pub async fn next_id(&self, collection: &str) -> Result<u64, DomainError> {
        self.vector_store.next_id(collection).await
    }

    #[instrument(skip(self, record, embedding), fields(key = %record.key))]
    pub async fn add(
        &self,
        collection: &str,
        record: &Record,
        embedding: &Embedding,
    ) -> Result<(), DomainError> {
        self.vector_store.add(collection, record, embedding).await
    }

    pub async fn count(&self, collection: &str) -> Result<usize, DomainError> {
        self.vector_store.count(collection).await
    }
}
