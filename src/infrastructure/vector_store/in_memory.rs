use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::domain::{
    ports::VectorStore, DistanceMetric, DomainError, Embedding, Record, SearchResult,
};

#[derive(Default)]
struct Collection {
    records: Vec<(Record, Embedding)>,
    sequence: AtomicU64,
}

pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
    metric: DistanceMetric,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::with_metric(DistanceMetric::default())
    }

    pub fn with_metric(metric: DistanceMetric) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            metric,
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(collection: &str) -> DomainError {
    DomainError::not_found(format!("collection '{collection}' does not exist"))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        _dimension: usize,
    ) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn next_id(&self, collection: &str) -> Result<u64, DomainError> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(store.sequence.fetch_add(1, Ordering::SeqCst))
    }

    async fn add(
        &self,
        collection: &str,
        record: &Record,
        embedding: &Embedding,
    ) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        if store.records.iter().any(|(r, _)| r.key == record.key) {
            return Err(DomainError::validation(format!(
                "record '{}' already exists in '{collection}'",
                record.key
            )));
        }
        store.records.push((record.clone(), embedding.clone()));
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut results: Vec<SearchResult> = store
            .records
            .iter()
            .map(|(record, embedding)| SearchResult {
                record: record.clone(),
                distance: query.distance(embedding, self.metric),
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }

    async fn count(&self, collection: &str) -> Result<usize, DomainError> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(store.records.len())
    }
}
