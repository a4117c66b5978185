//! Deterministic stand-ins for the hosted providers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::application::{
    AnswerGenerator, Collections, ContextResolver, ConversationLogger, CorpusService,
    ExternalKnowledge, RagService, VoiceAgent,
};
use crate::domain::{
    ports::{
        EmbeddingService, ExtractiveQa, KnowledgeSource, LlmService, SpeechSynthesizer, Summary,
        Transcriber,
    },
    AudioClip, AudioFormat, DomainError, Embedding, SpeechAudio,
};
use crate::infrastructure::InMemoryVectorStore;

const KEYWORDS: &[&str] = &[
    "capital", "india", "delhi", "quantum", "physics", "weather", "mercury", "planet",
];

/// One axis per keyword, set when the keyword occurs, then normalized.
/// Texts sharing no keyword end up a squared distance of 1.0 or more apart.
pub struct KeywordEmbedding;

impl KeywordEmbedding {
    fn vector(text: &str) -> Embedding {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let raw: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| if words.contains(k) { 1.0 } else { 0.0 })
            .collect();
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return Embedding::new(raw);
        }
        Embedding::new(raw.into_iter().map(|v| v / norm).collect())
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        KEYWORDS.len()
    }
}

/// Encyclopedia with canned pages that records every topic asked for.
#[derive(Default)]
pub struct CannedKnowledge {
    pages: HashMap<String, Summary>,
    fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl CannedKnowledge {
    pub fn with_page(mut self, topic: &str, summary: Summary) -> Self {
        self.pages.insert(topic.to_string(), summary);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeSource for CannedKnowledge {
    async fn summary(&self, topic: &str, _sentences: usize) -> Result<Summary, DomainError> {
        self.calls.lock().unwrap().push(topic.to_string());
        if self.fail {
            return Err(DomainError::external("encyclopedia unreachable"));
        }
        Ok(self.pages.get(topic).cloned().unwrap_or(Summary::Missing))
    }
}

/// Completion model with a fixed reply, or a fixed failure.
pub struct ScriptedLlm {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("model unavailable".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(DomainError::external)
    }

    async fn complete_with_system(&self, _system: &str, prompt: &str) -> Result<String, DomainError> {
        self.complete(prompt).await
    }
}

/// Returns the first listed span that occurs in the context, or nothing.
pub struct SpanQa {
    spans: Vec<String>,
    pub questions: Mutex<Vec<String>>,
}

impl SpanQa {
    pub fn new(spans: &[&str]) -> Self {
        Self {
            spans: spans.iter().map(|s| s.to_string()).collect(),
            questions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ExtractiveQa for SpanQa {
    async fn answer(&self, question: &str, context: &str) -> Result<String, DomainError> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self
            .spans
            .iter()
            .find(|span| context.contains(span.as_str()))
            .cloned()
            .unwrap_or_default())
    }
}

/// "Speaks" by returning the text bytes as mp3.
pub struct EchoSynthesizer;

#[async_trait]
impl SpeechSynthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, DomainError> {
        Ok(SpeechAudio {
            bytes: text.as_bytes().to_vec(),
            format: AudioFormat::Mp3,
        })
    }
}

/// Hears a fixed sentence in any non-empty clip.
pub struct FixedTranscriber(pub Option<String>);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> Result<Option<String>, DomainError> {
        Ok(self.0.clone())
    }
}

pub const NEW_DELHI: &str = "New Delhi is the capital of India.";

/// Prepared store with `passages` indexed as documents 0..n.
pub async fn rag_with(passages: &[&str]) -> Arc<RagService> {
    let rag = Arc::new(RagService::new(
        Arc::new(KeywordEmbedding),
        Arc::new(InMemoryVectorStore::new()),
        Collections::default(),
    ));
    rag.prepare().await.unwrap();

    let passages: Vec<String> = passages.iter().map(|p| p.to_string()).collect();
    CorpusService::new(rag.clone())
        .load_documents("test", &passages)
        .await
        .unwrap();
    rag
}

/// Builder for a fully faked agent.
pub struct AgentFixture {
    pub rag: Arc<RagService>,
    pub knowledge: Option<Arc<CannedKnowledge>>,
    pub llm: Arc<ScriptedLlm>,
    pub qa: Arc<SpanQa>,
    pub history: Arc<ConversationLogger>,
    pub template: Option<String>,
}

impl AgentFixture {
    pub async fn new(passages: &[&str]) -> Self {
        let rag = rag_with(passages).await;
        Self {
            history: Arc::new(ConversationLogger::new(rag.clone())),
            rag,
            knowledge: None,
            llm: Arc::new(ScriptedLlm::replying("A generated answer.")),
            qa: Arc::new(SpanQa::new(&["New Delhi"])),
            template: None,
        }
    }

    pub fn with_knowledge(mut self, knowledge: CannedKnowledge) -> Self {
        self.knowledge = Some(Arc::new(knowledge));
        self
    }

    pub fn with_llm(mut self, llm: ScriptedLlm) -> Self {
        self.llm = Arc::new(llm);
        self
    }

    pub fn with_qa(mut self, qa: SpanQa) -> Self {
        self.qa = Arc::new(qa);
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn resolver(&self) -> ContextResolver {
        let resolver = ContextResolver::new(self.rag.clone());
        match &self.knowledge {
            Some(knowledge) => {
                resolver.with_external(Arc::new(ExternalKnowledge::new(knowledge.clone())))
            }
            None => resolver,
        }
    }

    pub fn agent(&self) -> VoiceAgent {
        let mut answers = AnswerGenerator::new(self.qa.clone(), self.llm.clone());
        if let Some(template) = &self.template {
            answers = answers.with_template(template);
        }
        VoiceAgent::new(Arc::new(self.resolver()), Arc::new(answers), self.history.clone())
    }
}
