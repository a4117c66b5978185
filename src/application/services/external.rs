use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::domain::{
    ports::{KnowledgeSource, Summary},
    Lookup,
};

pub const DEFAULT_SENTENCES: usize = 2;

/// Encyclopedia fallback used when the corpus has nothing close enough.
pub struct ExternalKnowledge {
    source: Arc<dyn KnowledgeSource>,
    sentences: usize,
}

impl ExternalKnowledge {
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            source,
            sentences: DEFAULT_SENTENCES,
        }
    }

    pub fn with_sentences(mut self, sentences: usize) -> Self {
        self.sentences = sentences;
        self
    }

    pub async fn get_external_context(&self, query: &str) -> Lookup<String> {
        self.get_external_context_with(query, self.sentences).await
    }

    /// Looks up a short summary for `query`. An ambiguous topic is retried
    /// once with its first candidate; nothing is retried after that.
    #[instrument(skip(self))]
    pub async fn get_external_context_with(&self, query: &str, sentences: usize) -> Lookup<String> {
        match self.source.summary(query, sentences).await {
            Ok(Summary::Article(text)) => Lookup::Found(text).non_empty(),
            Ok(Summary::Missing) => Lookup::NotFound,
            Ok(Summary::Ambiguous(options)) => {
                let Some(first) = options.first() else {
                    debug!("ambiguous topic without candidates");
                    return Lookup::NotFound;
                };
                debug!(candidate = %first, "ambiguous topic, retrying with first candidate");
                match self.source.summary(first, sentences).await {
                    Ok(Summary::Article(text)) => Lookup::Found(text).non_empty(),
                    Ok(_) => Lookup::NotFound,
                    Err(e) => {
                        warn!(error = %e, "external lookup failed");
                        Lookup::Failed(e)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "external lookup failed");
                Lookup::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::CannedKnowledge;
    use crate::domain::DomainError;

    fn article(text: &str) -> Summary {
        Summary::Article(text.to_string())
    }

    #[tokio::test]
    async fn test_article_is_returned() {
        let source = Arc::new(
            CannedKnowledge::default().with_page("New Delhi", article("New Delhi is a city.")),
        );
        let external = ExternalKnowledge::new(source);

        assert_eq!(
            external.get_external_context("New Delhi").await.found(),
            Some("New Delhi is a city.".to_string())
        );
    }

    #[tokio::test]
    async fn test_ambiguous_topic_retries_first_candidate_once() {
        let source = Arc::new(
            CannedKnowledge::default()
                .with_page(
                    "Mercury",
                    Summary::Ambiguous(vec![
                        "Mercury (planet)".to_string(),
                        "Mercury (element)".to_string(),
                    ]),
                )
                .with_page("Mercury (planet)", article("Mercury is the smallest planet.")),
        );
        let external = ExternalKnowledge::new(source.clone());

        let text = external.get_external_context("Mercury").await.found();

        assert_eq!(text.as_deref(), Some("Mercury is the smallest planet."));
        assert_eq!(source.calls(), vec!["Mercury", "Mercury (planet)"]);
    }

    #[tokio::test]
    async fn test_second_ambiguity_is_not_retried() {
        let source = Arc::new(
            CannedKnowledge::default()
                .with_page("Java", Summary::Ambiguous(vec!["Java (island)".to_string()]))
                .with_page(
                    "Java (island)",
                    Summary::Ambiguous(vec!["Java (disambiguation)".to_string()]),
                ),
        );
        let external = ExternalKnowledge::new(source.clone());

        assert!(matches!(
            external.get_external_context("Java").await,
            Lookup::NotFound
        ));
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_ambiguity_without_candidates() {
        let source = Arc::new(CannedKnowledge::default().with_page("X", Summary::Ambiguous(vec![])));
        let external = ExternalKnowledge::new(source.clone());

        assert!(matches!(external.get_external_context("X").await, Lookup::NotFound));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_blank_pages_are_not_found() {
        let source = Arc::new(CannedKnowledge::default().with_page("Blank", article("  ")));
        let external = ExternalKnowledge::new(source);

        assert!(matches!(external.get_external_context("Nothing").await, Lookup::NotFound));
        assert!(matches!(external.get_external_context("Blank").await, Lookup::NotFound));
    }

    #[tokio::test]
    async fn test_source_error_is_failure() {
        let external = ExternalKnowledge::new(Arc::new(CannedKnowledge::failing()));

        assert!(matches!(
            external.get_external_context("India").await,
            Lookup::Failed(DomainError::ExternalService(_))
        ));
    }
}
