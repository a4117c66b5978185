use crate::domain::{errors::DomainError, AudioClip, SpeechAudio};
use async_trait::async_trait;

/// Speech-to-text. `Ok(None)` when the audio held no recognisable speech.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Option<String>, DomainError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, DomainError>;
}

/// Live capture, e.g. a microphone.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn capture(&self) -> Result<AudioClip, DomainError>;
}

#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: &SpeechAudio) -> Result<(), DomainError>;
}
