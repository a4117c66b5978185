mod audio;
mod conversation;
mod document;
mod embedding;
mod intent;
mod retrieval;

pub use audio::{AudioClip, AudioFormat, AudioInput, SpeechAudio};
pub use conversation::{Conversation, ConversationTurn, Message, MessageRole};
pub use document::{chunk_content, Document, Record, SearchResult};
pub use embedding::{DistanceMetric, Embedding};
pub use intent::Intent;
pub use retrieval::{Lookup, RetrievalResult};
