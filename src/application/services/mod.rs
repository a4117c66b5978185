mod agent;
mod answer;
mod context;
mod corpus;
mod external;
mod history;
mod rag;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::{AgentReply, AnswerSource, VoiceAgent, DEFAULT_APOLOGY};
pub use answer::{AnswerGenerator, DEFAULT_GENERATIVE_TEMPLATE, DEFAULT_HISTORY_TEMPLATE};
pub use context::{ContextOrigin, ContextResolver, ResolvedContext, DEFAULT_DISTANCE_THRESHOLD};
pub use corpus::{CorpusService, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_CORPUS};
pub use external::{ExternalKnowledge, DEFAULT_SENTENCES};
pub use history::{ConversationLogger, DEFAULT_RECALL_TOP_K};
pub use rag::{Collections, RagService};
