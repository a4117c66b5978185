use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::{anthropic, gemini, openai};
use std::time::Duration;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::{LlmConfig, LlmProvider, QaConfig};
use crate::infrastructure::require_env;

/// Completion through one of rig's hosted providers, with fixed sampling
/// settings for every call.
pub struct RigLlm {
    provider: LlmProvider,
    model: String,
    temperature: f64,
    max_tokens: u64,
    timeout: Duration,
}

impl RigLlm {
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            provider,
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout: Duration::from_secs(defaults.timeout_seconds),
        }
    }

    /// Sampling model for the generative fallback.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.provider, &config.model)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_timeout(Duration::from_secs(config.timeout_seconds))
    }

    /// Near-deterministic model for span extraction.
    pub fn for_extraction(llm: &LlmConfig, qa: &QaConfig) -> Self {
        Self::new(llm.provider, &qa.model)
            .with_temperature(0.0)
            .with_max_tokens(qa.max_tokens)
            .with_timeout(Duration::from_secs(llm.timeout_seconds))
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn prompt(&self, system: Option<&str>, prompt: &str) -> Result<String, DomainError> {
        let preamble = system.unwrap_or_default();

        let request = async {
            match self.provider {
                LlmProvider::Gemini => {
                    require_env("GEMINI_API_KEY")?;
                    let agent = gemini::Client::from_env()
                        .agent(&self.model)
                        .preamble(preamble)
                        .temperature(self.temperature)
                        .max_tokens(self.max_tokens)
                        .build();
                    agent.prompt(prompt).await.map_err(|e| DomainError::external(e.to_string()))
                }
                LlmProvider::Anthropic => {
                    require_env("ANTHROPIC_API_KEY")?;
                    let agent = anthropic::Client::from_env()
                        .agent(&self.model)
                        .preamble(preamble)
                        .temperature(self.temperature)
                        .max_tokens(self.max_tokens)
                        .build();
                    agent.prompt(prompt).await.map_err(|e| DomainError::external(e.to_string()))
                }
                LlmProvider::OpenAi => {
                    require_env("OPENAI_API_KEY")?;
                    let agent = openai::Client::from_env()
                        .agent(&self.model)
                        .preamble(preamble)
                        .temperature(self.temperature)
                        .max_tokens(self.max_tokens)
                        .build();
                    agent.prompt(prompt).await.map_err(|e| DomainError::external(e.to_string()))
                }
            }
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DomainError::timeout("LLM request timed out"))?
    }
}

#[async_trait]
impl LlmService for RigLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompt(None, prompt).await
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.prompt(Some(system), prompt).await
    }
}
