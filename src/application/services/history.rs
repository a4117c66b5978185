use std::sync::Arc;
use tracing::instrument;

use crate::application::RagService;
use crate::domain::{ConversationTurn, DomainError};

pub const DEFAULT_RECALL_TOP_K: usize = 5;

/// Semantic memory of answered queries, kept beside the document index.
pub struct ConversationLogger {
    rag: Arc<RagService>,
}

impl ConversationLogger {
    pub fn new(rag: Arc<RagService>) -> Self {
        Self { rag }
    }

    /// Stores one turn keyed by the query's embedding and returns its id.
    #[instrument(skip(self, response))]
    pub async fn store_conversation_history(
        &self,
        query: &str,
        response: &str,
    ) -> Result<u64, DomainError> {
        let collection = &self.rag.collections().history;
        let embedding = self.rag.embed(query).await?;
        let id = self.rag.next_id(collection).await?;
        let turn = ConversationTurn::new(id, query, response);

        self.rag.add(collection, &turn.to_record(), &embedding).await?;
        tracing::debug!(turn_id = id, "conversation turn stored");
        Ok(id)
    }

    /// Responses of the turns whose queries sit closest to `query`.
    #[instrument(skip(self))]
    pub async fn retrieve_conversation_history(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, DomainError> {
        let collection = &self.rag.collections().history;
        let hits = self.rag.nearest(collection, query, top_k).await?;
        Ok(hits.into_iter().map(|hit| hit.record.text).collect())
    }

    pub async fn turn_count(&self) -> Result<usize, DomainError> {
        self.rag.count(&self.rag.collections().history).await
    }
}
