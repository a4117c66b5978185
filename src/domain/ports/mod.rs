mod embedding;
mod knowledge;
mod llm;
mod qa;
mod speech;
mod vector_store;

pub use embedding::EmbeddingService;
pub use knowledge::{KnowledgeSource, Summary};
pub use llm::LlmService;
pub use qa::ExtractiveQa;
pub use speech::{AudioSink, AudioSource, SpeechSynthesizer, Transcriber};
pub use vector_store::VectorStore;
