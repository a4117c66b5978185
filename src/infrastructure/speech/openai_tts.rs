use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::domain::{ports::SpeechSynthesizer, AudioFormat, DomainError, SpeechAudio};
use crate::infrastructure::{config::SpeechConfig, require_env};

/// Text-to-speech through OpenAI's `/v1/audio/speech` endpoint.
pub struct OpenAiSpeech {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl OpenAiSpeech {
    pub fn new(api_key: impl Into<String>, config: &SpeechConfig) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.tts_model.clone(),
            voice: config.voice.clone(),
        })
    }

    pub fn from_env(config: &SpeechConfig) -> Result<Self, DomainError> {
        Self::new(require_env("OPENAI_API_KEY")?, config)
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("cannot speak empty text"));
        }

        let format = AudioFormat::Mp3;
        let response = self
            .http
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model: &self.model,
                input: text,
                voice: &self.voice,
                response_format: format.extension(),
            })
            .send()
            .await
            .map_err(|e| DomainError::synthesis(e.to_string()))?
            .error_for_status()
            .map_err(|e| DomainError::synthesis(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::synthesis(e.to_string()))?;

        Ok(SpeechAudio {
            bytes: bytes.to_vec(),
            format,
        })
    }
}
