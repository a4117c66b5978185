use async_trait::async_trait;
use rig::client::ProviderClient;
use rig::prelude::TranscriptionClient;
use rig::providers::openai;
use rig::transcription::TranscriptionModel;
use std::io::Write;
use std::time::Duration;

use crate::domain::{ports::Transcriber, AudioClip, DomainError};
use crate::infrastructure::{config::SpeechConfig, require_env};

/// Speech-to-text through OpenAI's Whisper endpoint via rig.
pub struct WhisperTranscriber {
    model: String,
    timeout: Duration,
}

impl WhisperTranscriber {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(&config.transcription_model)
            .with_timeout(Duration::from_secs(config.timeout_seconds))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Option<String>, DomainError> {
        require_env("OPENAI_API_KEY")?;

        // rig reads the upload from disk; the file extension tells the
        // endpoint which codec to expect.
        let extension = std::path::Path::new(&clip.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("wav");
        let mut file = tempfile::Builder::new()
            .prefix("question-")
            .suffix(&format!(".{extension}"))
            .tempfile()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        file.write_all(&clip.bytes)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let path = file
            .path()
            .to_str()
            .ok_or_else(|| DomainError::internal("temporary path is not valid UTF-8"))?
            .to_string();

        let model = openai::Client::from_env().transcription_model(&self.model);
        let request = model.transcription_request().load_file(&path).send();

        let transcription = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DomainError::timeout("transcription timed out"))?
            .map_err(|e| DomainError::transcription(e.to_string()))?;

        let text = transcription.text.trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }
}
