pub mod config;
pub mod embedding;
pub mod knowledge;
pub mod llm;
pub mod qa;
pub mod runtime;
pub mod speech;
pub mod vector_store;

pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::TextEmbedding;
pub use knowledge::WikipediaClient;
pub use llm::RigLlm;
pub use qa::LlmExtractiveQa;
pub use runtime::AgentRuntime;
pub use speech::{CommandMicrophone, CommandPlayer, OpenAiSpeech, WhisperTranscriber};
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};

use crate::domain::DomainError;

/// Reads a credential up front so a missing key is an error, not a panic
/// inside a provider client.
pub(crate) fn require_env(key: &str) -> Result<String, DomainError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| DomainError::validation(format!("{key} is not set")))
}
