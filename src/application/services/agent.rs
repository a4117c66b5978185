use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::application::{AnswerGenerator, ContextOrigin, ContextResolver, ConversationLogger};
use crate::domain::{
    ports::{SpeechSynthesizer, Transcriber},
    AudioClip, AudioInput, DomainError, Intent, Lookup, SpeechAudio,
};

pub const DEFAULT_APOLOGY: &str = "I'm sorry, I cannot generate an answer at this time.";

/// Which path produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Corpus,
    External,
    Generative,
    Intent,
    Apology,
}

impl From<ContextOrigin> for AnswerSource {
    fn from(origin: ContextOrigin) -> Self {
        match origin {
            ContextOrigin::Corpus => Self::Corpus,
            ContextOrigin::External => Self::External,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentReply {
    pub query: String,
    pub answer: String,
    pub source: AnswerSource,
    /// `None` when the turn could not be written to history.
    pub turn_id: Option<u64>,
    /// `None` when no synthesizer is configured or synthesis failed.
    pub audio: Option<SpeechAudio>,
}

/// Runs one question end to end: find context, answer from it or fall back
/// to generation, speak the answer, log the turn.
pub struct VoiceAgent {
    resolver: Arc<ContextResolver>,
    answers: Arc<AnswerGenerator>,
    history: Arc<ConversationLogger>,
    transcriber: Option<Arc<dyn Transcriber>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    intents_enabled: bool,
    apology: String,
}

impl VoiceAgent {
    pub fn new(
        resolver: Arc<ContextResolver>,
        answers: Arc<AnswerGenerator>,
        history: Arc<ConversationLogger>,
    ) -> Self {
        Self {
            resolver,
            answers,
            history,
            transcriber: None,
            synthesizer: None,
            intents_enabled: false,
            apology: DEFAULT_APOLOGY.to_string(),
        }
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_intents(mut self, enabled: bool) -> Self {
        self.intents_enabled = enabled;
        self
    }

    pub fn with_apology(mut self, apology: impl Into<String>) -> Self {
        self.apology = apology.into();
        self
    }

    /// Answers a text query. Only a blank query is an error; every other
    /// failure degrades to a weaker answer.
    pub async fn answer(&self, query: &str) -> Result<AgentReply, DomainError> {
        self.answer_with_history(query, "").await
    }

    /// Like [`answer`](Self::answer), with earlier turns of the session as
    /// `Speaker: text` lines for the generative prompt.
    #[instrument(skip(self, history))]
    pub async fn answer_with_history(
        &self,
        query: &str,
        history: &str,
    ) -> Result<AgentReply, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::validation("query is empty"));
        }
        info!(query, "user query");

        let (answer, source) = self.decide(query, history).await;
        info!(answer = %answer, ?source, "answer ready");

        let audio = self.speak(&answer).await;
        let turn_id = match self.history.store_conversation_history(query, &answer).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "failed to store conversation turn");
                None
            }
        };

        Ok(AgentReply {
            query: query.to_string(),
            answer,
            source,
            turn_id,
            audio,
        })
    }

    /// Transcribes `input` and answers it.
    pub async fn answer_audio(&self, input: AudioInput) -> Result<AgentReply, DomainError> {
        self.answer_audio_with_history(input, "").await
    }

    pub async fn answer_audio_with_history(
        &self,
        input: AudioInput,
        history: &str,
    ) -> Result<AgentReply, DomainError> {
        let query = self
            .transcribe(input)
            .await?
            .ok_or_else(|| DomainError::transcription("could not understand audio"))?;
        self.answer_with_history(&query, history).await
    }

    #[instrument(skip(self, input))]
    pub async fn transcribe(&self, input: AudioInput) -> Result<Option<String>, DomainError> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| DomainError::validation("no transcriber configured"))?;

        let clip = match input {
            AudioInput::Clip(clip) => clip,
            AudioInput::File(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| DomainError::not_found(format!("{}: {e}", path.display())))?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "audio.wav".to_string());
                AudioClip { bytes, file_name }
            }
        };
        if clip.is_empty() {
            return Ok(None);
        }

        let text = transcriber.transcribe(&clip).await?;
        Ok(text.filter(|t| !t.trim().is_empty()))
    }

    async fn decide(&self, query: &str, history: &str) -> (String, AnswerSource) {
        if self.intents_enabled {
            if let Some(intent) = Intent::detect(query) {
                info!(?intent, "intent matched");
                return (intent.execute().to_string(), AnswerSource::Intent);
            }
        }

        match self.resolver.resolve(query).await {
            Lookup::Found(context) => {
                if let Lookup::Found(answer) = self.answers.extractive(query, &context.text).await {
                    return (answer, context.origin.into());
                }
                info!("context gave no answer, using generative fallback");
            }
            Lookup::NotFound => info!("no relevant context, using generative fallback"),
            Lookup::Failed(e) => warn!(error = %e, "context lookup failed, using generative fallback"),
        }

        match self.answers.generative(query, history).await {
            Lookup::Found(answer) => (answer, AnswerSource::Generative),
            _ => (self.apology.clone(), AnswerSource::Apology),
        }
    }

    async fn speak(&self, text: &str) -> Option<SpeechAudio> {
        let synthesizer = self.synthesizer.as_ref()?;
        match synthesizer.synthesize(text).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!(error = %e, "speech synthesis failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::{
        AgentFixture, CannedKnowledge, EchoSynthesizer, FixedTranscriber, ScriptedLlm, SpanQa,
        NEW_DELHI,
    };
    use crate::domain::ports::Summary;

    #[tokio::test]
    async fn test_corpus_question_is_answered_extractively() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let agent = fixture.agent();

        let reply = agent.answer("What is the capital of India?").await.unwrap();

        assert_eq!(reply.answer, "New Delhi");
        assert_eq!(reply.source, AnswerSource::Corpus);
        assert_eq!(reply.turn_id, Some(0));
        assert!(reply.audio.is_none());
        assert!(fixture.llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_question_is_generated() {
        let fixture = AgentFixture::new(&[NEW_DELHI])
            .await
            .with_llm(ScriptedLlm::replying("Quantum physics describes tiny things."));
        let agent = fixture.agent();

        let reply = agent.answer("Explain quantum physics").await.unwrap();

        assert_eq!(reply.source, AnswerSource::Generative);
        assert_eq!(reply.answer, "Quantum physics describes tiny things.");
        assert!(fixture.qa.questions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_context_without_span_falls_back_to_generation() {
        let fixture = AgentFixture::new(&[NEW_DELHI])
            .await
            .with_qa(SpanQa::new(&["Mumbai"]));
        let agent = fixture.agent();

        let reply = agent.answer("capital of India").await.unwrap();
        assert_eq!(reply.source, AnswerSource::Generative);
    }

    #[tokio::test]
    async fn test_external_context_answers_extractively() {
        let query = "Where does the government sit?";
        let fixture = AgentFixture::new(&[NEW_DELHI]).await.with_knowledge(
            CannedKnowledge::default().with_page(
                query,
                Summary::Article("The government sits in New Delhi.".to_string()),
            ),
        );
        let agent = fixture.agent();

        let reply = agent.answer(query).await.unwrap();

        assert_eq!(reply.answer, "New Delhi");
        assert_eq!(reply.source, AnswerSource::External);
    }

    #[tokio::test]
    async fn test_apology_when_every_stage_fails() {
        let fixture = AgentFixture::new(&[])
            .await
            .with_knowledge(CannedKnowledge::failing())
            .with_llm(ScriptedLlm::failing());
        let agent = fixture.agent();

        let reply = agent.answer("Explain quantum physics").await.unwrap();

        assert_eq!(reply.answer, DEFAULT_APOLOGY);
        assert_eq!(reply.source, AnswerSource::Apology);
        assert_eq!(reply.turn_id, Some(0));
    }

    #[tokio::test]
    async fn test_every_turn_is_logged_in_order() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let agent = fixture.agent();

        for (expected, query) in ["capital of India", "quantum physics", "weather"]
            .iter()
            .enumerate()
        {
            let reply = agent.answer(query).await.unwrap();
            assert_eq!(reply.turn_id, Some(expected as u64));
        }

        let recalled = fixture
            .history
            .retrieve_conversation_history("capital of India", 1)
            .await
            .unwrap();
        assert_eq!(recalled, vec!["New Delhi".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let err = fixture.agent().answer("   ").await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(fixture.history.turn_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_intent_short_circuits_retrieval() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let agent = fixture.agent().with_intents(true);

        let reply = agent.answer("Book an appointment for Monday").await.unwrap();

        assert_eq!(reply.source, AnswerSource::Intent);
        assert_eq!(reply.answer, "Your appointment has been successfully booked.");
        assert!(fixture.llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_intents_disabled_by_default() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let reply = fixture.agent().answer("Book an appointment").await.unwrap();

        assert_eq!(reply.source, AnswerSource::Generative);
    }

    #[tokio::test]
    async fn test_answer_is_spoken() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let agent = fixture.agent().with_synthesizer(Arc::new(EchoSynthesizer));

        let reply = agent.answer("capital of India").await.unwrap();
        let audio = reply.audio.unwrap();

        assert_eq!(audio.bytes, b"New Delhi".to_vec());
    }

    #[tokio::test]
    async fn test_spoken_question() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let agent = fixture.agent().with_transcriber(Arc::new(FixedTranscriber(Some(
            "What is the capital of India?".to_string(),
        ))));

        let reply = agent
            .answer_audio(AudioInput::Clip(AudioClip::wav(vec![0; 16])))
            .await
            .unwrap();

        assert_eq!(reply.query, "What is the capital of India?");
        assert_eq!(reply.answer, "New Delhi");
    }

    #[tokio::test]
    async fn test_unintelligible_audio_is_transcription_error() {
        let fixture = AgentFixture::new(&[NEW_DELHI]).await;
        let agent = fixture
            .agent()
            .with_transcriber(Arc::new(FixedTranscriber(None)));

        let err = agent
            .answer_audio(AudioInput::Clip(AudioClip::wav(vec![0; 16])))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Transcription(_)));

        let silent = agent
            .transcribe(AudioInput::Clip(AudioClip::wav(Vec::new())))
            .await
            .unwrap();
        assert!(silent.is_none());
    }

    #[tokio::test]
    async fn test_audio_requires_transcriber() {
        let fixture = AgentFixture::new(&[]).await;
        let err = fixture
            .agent()
            .answer_audio(AudioInput::File("/nonexistent.wav".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }
}
