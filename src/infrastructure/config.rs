use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::application::{
    DEFAULT_APOLOGY, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_DISTANCE_THRESHOLD,
    DEFAULT_GENERATIVE_TEMPLATE, DEFAULT_HISTORY_TEMPLATE, DEFAULT_RECALL_TOP_K,
    DEFAULT_SENTENCES,
};
use crate::domain::{DistanceMetric, DomainError};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

/// Runtime settings plus prompt text, loaded from two YAML files.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub qa: QaConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub rag: RagConfig,
    pub corpus: CorpusConfig,
    pub external: ExternalConfig,
    pub speech: SpeechConfig,
    pub intents: IntentsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    Anthropic,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_tokens: 100,
            timeout_seconds: 60,
        }
    }
}

/// Extractive answering runs on the same provider as generation, with its
/// own model and a deterministic temperature.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub model: String,
    pub max_tokens: u64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    #[default]
    InMemory,
    Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    pub qdrant_url: String,
    pub metric: DistanceMetric,
    pub documents_collection: String,
    pub history_collection: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::InMemory,
            qdrant_url: "http://localhost:6334".to_string(),
            metric: DistanceMetric::SquaredL2,
            documents_collection: "document_collection".to_string(),
            history_collection: "conversation_history".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// A corpus document counts as context only when strictly closer than this.
    pub distance_threshold: f32,
    pub external_fallback: bool,
    pub recall_top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            external_fallback: true,
            recall_top_k: DEFAULT_RECALL_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: Option<PathBuf>,
    pub chunk_size: usize,
    /// Characters of trailing paragraphs repeated at the start of the next chunk.
    pub chunk_overlap: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub base_url: String,
    pub sentences: usize,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".to_string(),
            sentences: DEFAULT_SENTENCES,
            timeout_seconds: 10,
            user_agent: concat!("voice-rag-agent/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub transcription_model: String,
    pub tts_model: String,
    pub voice: String,
    pub openai_base_url: String,
    pub timeout_seconds: u64,
    /// Program and arguments; `{output}` and `{seconds}` are substituted.
    pub recorder_command: Vec<String>,
    /// Program and arguments; `{input}` is substituted.
    pub player_command: Vec<String>,
    pub record_seconds: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transcription_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
            timeout_seconds: 30,
            recorder_command: [
                "arecord", "-q", "-f", "S16_LE", "-r", "16000", "-c", "1", "-d", "{seconds}",
                "{output}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            player_command: ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet", "{input}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            record_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntentsConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub generative: GenerativePrompts,
    pub extractive: ExtractivePrompts,
    pub apology: ApologyPrompt,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerativePrompts {
    pub system: String,
    /// `{query}` is replaced with the user's question, `{history}` with the
    /// rendered `history` block (empty on the first turn).
    pub template: String,
    /// `{turns}` is replaced with earlier `Speaker: text` lines.
    pub history: String,
}

impl Default for GenerativePrompts {
    fn default() -> Self {
        Self {
            system: String::new(),
            template: DEFAULT_GENERATIVE_TEMPLATE.to_string(),
            history: DEFAULT_HISTORY_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractivePrompts {
    pub system: String,
}

impl Default for ExtractivePrompts {
    fn default() -> Self {
        Self {
            system: "You answer questions by quoting the context. Reply with the shortest \
                     exact span copied from the context that answers the question, with no \
                     other words. If the context does not contain the answer, reply with \
                     nothing."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApologyPrompt {
    pub text: String,
}

impl Default for ApologyPrompt {
    fn default() -> Self {
        Self {
            text: DEFAULT_APOLOGY.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `CONFIG_PATH` and `PROMPTS_PATH` (or the defaults), then applies
    /// environment overrides. A missing file means defaults.
    pub fn load() -> Result<Self, DomainError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let prompts_path =
            std::env::var("PROMPTS_PATH").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.into());

        let mut app = Self::from_paths(Path::new(&config_path), Path::new(&prompts_path))?;
        app.apply_env();
        app.validate()?;
        Ok(app)
    }

    pub fn from_paths(config_path: &Path, prompts_path: &Path) -> Result<Self, DomainError> {
        Ok(Self {
            config: read_yaml(config_path)?,
            prompts: read_yaml(prompts_path)?,
        })
    }

    pub fn from_yaml(config: &str, prompts: &str) -> Result<Self, DomainError> {
        let app = Self {
            config: parse_yaml(config, "config")?,
            prompts: parse_yaml(prompts, "prompts")?,
        };
        app.validate()?;
        Ok(app)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            self.config.server.port = port;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            self.config.vector_store.qdrant_url = url;
            self.config.vector_store.backend = VectorBackend::Qdrant;
        }
        if let Ok(path) = std::env::var("CORPUS_PATH") {
            self.config.corpus.path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let c = &self.config;
        if c.rag.distance_threshold.is_nan() || c.rag.distance_threshold <= 0.0 {
            return Err(DomainError::validation(
                "rag.distance_threshold must be greater than zero",
            ));
        }
        if c.rag.recall_top_k == 0 {
            return Err(DomainError::validation("rag.recall_top_k must be at least 1"));
        }
        if c.external.sentences == 0 {
            return Err(DomainError::validation("external.sentences must be at least 1"));
        }
        if c.corpus.chunk_size == 0 {
            return Err(DomainError::validation("corpus.chunk_size must be at least 1"));
        }
        if c.corpus.chunk_overlap >= c.corpus.chunk_size {
            return Err(DomainError::validation(
                "corpus.chunk_overlap must be smaller than corpus.chunk_size",
            ));
        }
        if c.embedding.dimension == 0 {
            return Err(DomainError::validation("embedding.dimension must be at least 1"));
        }
        Ok(())
    }
}

fn read_yaml<T>(path: &Path) -> Result<T, DomainError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match std::fs::read_to_string(path) {
        Ok(content) => parse_yaml(&content, &path.display().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(T::default())
        }
        Err(e) => Err(DomainError::validation(format!("{}: {e}", path.display()))),
    }
}

fn parse_yaml<T>(content: &str, origin: &str) -> Result<T, DomainError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(content).map_err(|e| DomainError::validation(format!("{origin}: {e}")))
}
