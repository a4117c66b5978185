use std::sync::Arc;
use tracing::{info, warn};

use crate::application::{
    AnswerGenerator, Collections, ContextResolver, ConversationLogger, CorpusService,
    ExternalKnowledge, RagService, VoiceAgent,
};
use crate::domain::ports::{EmbeddingService, VectorStore};
use crate::infrastructure::config::{AppConfig, VectorBackend};
use crate::infrastructure::{
    InMemoryVectorStore, LlmExtractiveQa, OpenAiSpeech, QdrantVectorStore, RigLlm, TextEmbedding,
    WhisperTranscriber, WikipediaClient,
};

/// Everything a front end needs, built once from configuration.
pub struct AgentRuntime {
    pub agent: Arc<VoiceAgent>,
    pub history: Arc<ConversationLogger>,
    pub rag: Arc<RagService>,
    pub config: Arc<AppConfig>,
}

impl AgentRuntime {
    /// Wires the hosted providers named in `config`, prepares both
    /// collections and indexes the corpus.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let c = &config.config;

        let embedding: Arc<dyn EmbeddingService> =
            Arc::new(TextEmbedding::from_config(&c.embedding));
        let vector_store: Arc<dyn VectorStore> = match c.vector_store.backend {
            VectorBackend::InMemory => {
                Arc::new(InMemoryVectorStore::with_metric(c.vector_store.metric))
            }
            VectorBackend::Qdrant => {
                info!(url = %c.vector_store.qdrant_url, "using qdrant");
                Arc::new(QdrantVectorStore::new(
                    &c.vector_store.qdrant_url,
                    c.vector_store.metric,
                )?)
            }
        };

        Self::assemble(config, embedding, vector_store).await
    }

    pub(crate) async fn assemble(
        config: AppConfig,
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
    ) -> anyhow::Result<Self> {
        let c = &config.config;
        let prompts = &config.prompts;

        let collections = Collections {
            documents: c.vector_store.documents_collection.clone(),
            history: c.vector_store.history_collection.clone(),
        };
        let rag = Arc::new(RagService::new(embedding, vector_store, collections));
        rag.prepare().await?;

        // A persistent store keeps the corpus from the previous run.
        let indexed = rag.count(&rag.collections().documents).await?;
        if indexed > 0 {
            info!(documents = indexed, "corpus already indexed");
        } else {
            let corpus = CorpusService::with_chunking(
                rag.clone(),
                c.corpus.chunk_size,
                c.corpus.chunk_overlap,
            );
            let documents = match &c.corpus.path {
                Some(path) => corpus.load_file(path).await?,
                None => corpus.load_default().await?,
            };
            info!(documents = documents.len(), "corpus ready");
        }

        let mut resolver =
            ContextResolver::new(rag.clone()).with_threshold(c.rag.distance_threshold);
        if c.rag.external_fallback {
            let wikipedia = Arc::new(WikipediaClient::new(&c.external)?);
            let external = ExternalKnowledge::new(wikipedia).with_sentences(c.external.sentences);
            resolver = resolver.with_external(Arc::new(external));
        }

        let generator = Arc::new(RigLlm::from_config(&c.llm));
        let extractor = Arc::new(RigLlm::for_extraction(&c.llm, &c.qa));
        let qa = Arc::new(LlmExtractiveQa::new(extractor, &prompts.extractive.system));
        let answers = AnswerGenerator::new(qa, generator)
            .with_system_prompt(&prompts.generative.system)
            .with_template(&prompts.generative.template)
            .with_history_template(&prompts.generative.history);

        let history = Arc::new(ConversationLogger::new(rag.clone()));

        let mut agent = VoiceAgent::new(Arc::new(resolver), Arc::new(answers), history.clone())
            .with_intents(c.intents.enabled)
            .with_apology(&prompts.apology.text);

        if c.speech.enabled {
            agent = agent.with_transcriber(Arc::new(WhisperTranscriber::from_config(&c.speech)));
            match OpenAiSpeech::from_env(&c.speech) {
                Ok(speech) => agent = agent.with_synthesizer(Arc::new(speech)),
                Err(e) => warn!(error = %e, "speech synthesis disabled"),
            }
        }

        Ok(Self {
            agent: Arc::new(agent),
            history,
            rag,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::KeywordEmbedding;

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.config.rag.external_fallback = false;
        config.config.speech.enabled = false;
        config
    }

    async fn assemble_on(store: Arc<dyn VectorStore>) -> AgentRuntime {
        AgentRuntime::assemble(offline_config(), Arc::new(KeywordEmbedding), store)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_restart_keeps_existing_corpus() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());

        for _ in 0..3 {
            let runtime = assemble_on(store.clone()).await;
            let documents = &runtime.rag.collections().documents;
            assert_eq!(runtime.rag.count(documents).await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_history_survives_restart() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
        let first = assemble_on(store.clone()).await;
        first
            .history
            .store_conversation_history("capital of India", "New Delhi")
            .await
            .unwrap();

        let second = assemble_on(store).await;
        let id = second
            .history
            .store_conversation_history("weather", "Sunny")
            .await
            .unwrap();
        assert_eq!(id, 1);
    }
}
