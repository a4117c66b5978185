use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::application::{ExternalKnowledge, RagService};
use crate::domain::{DomainError, Lookup, RetrievalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOrigin {
    Corpus,
    External,
}

#[derive(Debug, Clone)]
pub struct ResolvedContext {
    pub text: String,
    pub origin: ContextOrigin,
}

pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.5;

/// Finds the passage that answers a query: the nearest corpus document if it
/// is close enough, otherwise whatever the external source knows.
pub struct ContextResolver {
    rag: Arc<RagService>,
    external: Option<Arc<ExternalKnowledge>>,
    threshold: f32,
}

impl ContextResolver {
    pub fn new(rag: Arc<RagService>) -> Self {
        Self {
            rag,
            external: None,
            threshold: DEFAULT_DISTANCE_THRESHOLD,
        }
    }

    pub fn with_external(mut self, external: Arc<ExternalKnowledge>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// The single nearest document, if its distance is strictly below the
    /// threshold.
    #[instrument(skip(self))]
    pub async fn nearest_document(&self, query: &str) -> Lookup<RetrievalResult> {
        let collection = &self.rag.collections().documents;
        let hits = match self.rag.nearest(collection, query, 1).await {
            Ok(hits) => hits,
            Err(e) => return Lookup::Failed(e),
        };

        match hits.into_iter().next() {
            Some(hit) if hit.distance < self.threshold => {
                debug!(key = %hit.record.key, distance = hit.distance, "document within threshold");
                Lookup::Found(RetrievalResult {
                    text: hit.record.text,
                    distance: hit.distance,
                })
            }
            Some(hit) => {
                debug!(distance = hit.distance, threshold = self.threshold, "nearest document too far");
                Lookup::NotFound
            }
            None => Lookup::NotFound,
        }
    }

    pub async fn retrieve_context(&self, query: &str) -> Lookup<String> {
        self.resolve(query).await.map(|context| context.text)
    }

    /// Corpus first, then the external source when one is configured.
    #[instrument(skip(self))]
    pub async fn resolve(&self, query: &str) -> Lookup<ResolvedContext> {
        let local_failure: Option<DomainError> = match self.nearest_document(query).await {
            Lookup::Found(result) => {
                return Lookup::Found(ResolvedContext {
                    text: result.text,
                    origin: ContextOrigin::Corpus,
                })
            }
            Lookup::NotFound => None,
            Lookup::Failed(e) => {
                warn!(error = %e, "corpus lookup failed");
                Some(e)
            }
        };

        let Some(external) = &self.external else {
            return local_failure.map_or(Lookup::NotFound, Lookup::Failed);
        };

        match external.get_external_context(query).await {
            Lookup::Found(text) => {
                info!("context resolved from external source");
                Lookup::Found(ResolvedContext {
                    text,
                    origin: ContextOrigin::External,
                })
            }
            Lookup::NotFound => local_failure.map_or(Lookup::NotFound, Lookup::Failed),
            Lookup::Failed(e) => Lookup::Failed(local_failure.unwrap_or(e)),
        }
    }
}
