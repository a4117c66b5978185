use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::domain::{
    ports::VectorStore, DistanceMetric, DomainError, Embedding, Record, SearchResult,
};

/// Qdrant-backed collections. Each collection's id sequence starts at the
/// number of points already stored when the collection is first ensured.
pub struct QdrantVectorStore {
    client: Qdrant,
    metric: DistanceMetric,
    sequences: RwLock<HashMap<String, AtomicU64>>,
}

impl QdrantVectorStore {
    pub fn new(url: &str, metric: DistanceMetric) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(Self {
            client,
            metric,
            sequences: RwLock::new(HashMap::new()),
        })
    }

    fn qdrant_distance(&self) -> Distance {
        match self.metric {
            DistanceMetric::SquaredL2 => Distance::Euclid,
            DistanceMetric::Cosine => Distance::Cosine,
        }
    }

    /// Qdrant reports Euclidean distance and cosine similarity; both are
    /// mapped onto this crate's lower-is-closer distances.
    fn to_distance(&self, score: f32) -> f32 {
        match self.metric {
            DistanceMetric::SquaredL2 => score * score,
            DistanceMetric::Cosine => 1.0 - score,
        }
    }

    async fn exact_count(&self, collection: &str) -> Result<u64, DomainError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), DomainError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let exists = collections.collections.iter().any(|c| c.name == collection);

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(collection).vectors_config(
                        VectorParamsBuilder::new(dimension as u64, self.qdrant_distance()),
                    ),
                )
                .await
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        let existing = self.exact_count(collection).await?;
        self.sequences
            .write()
            .await
            .entry(collection.to_string())
            .or_insert_with(|| AtomicU64::new(existing));

        Ok(())
    }

    async fn next_id(&self, collection: &str) -> Result<u64, DomainError> {
        let sequences = self.sequences.read().await;
        let sequence = sequences.get(collection).ok_or_else(|| {
            DomainError::not_found(format!("collection '{collection}' was not ensured"))
        })?;
        Ok(sequence.fetch_add(1, Ordering::SeqCst))
    }

    async fn add(
        &self,
        collection: &str,
        record: &Record,
        embedding: &Embedding,
    ) -> Result<(), DomainError> {
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let payload: Payload = serde_json::json!({
            "id": record.id,
            "key": record.key,
            "text": record.text,
            "metadata": metadata,
        })
        .try_into()
        .map_err(|_| DomainError::internal("Failed to create payload"))?;

        let point = PointStruct::new(record.id, embedding.as_slice().to_vec(), payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, query.as_slice().to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let search_results: Vec<SearchResult> = results
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;

                let key = payload.get("key")?.as_str()?.to_string();
                let text = payload.get("text")?.as_str()?.to_string();
                let metadata = payload
                    .get("metadata")
                    .and_then(|m| m.as_str())
                    .and_then(|m| serde_json::from_str(m).ok())
                    .unwrap_or_else(|| serde_json::json!({}));
                let id = payload.get("id")?.as_integer()? as u64;

                Some(SearchResult {
                    record: Record {
                        id,
                        key,
                        text,
                        metadata,
                    },
                    distance: self.to_distance(point.score),
                })
            })
            .collect();

        Ok(search_results)
    }

    async fn count(&self, collection: &str) -> Result<usize, DomainError> {
        Ok(self.exact_count(collection).await? as usize)
    }
}
