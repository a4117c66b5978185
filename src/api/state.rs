use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::{ConversationLogger, RagService, VoiceAgent};
use crate::domain::Conversation;
use crate::infrastructure::{AgentRuntime, AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<VoiceAgent>,
    pub history: Arc<ConversationLogger>,
    pub rag: Arc<RagService>,
    /// Session transcript shown by the conversation endpoints. The semantic
    /// history in the vector store is never cleared.
    pub transcript: Arc<RwLock<Conversation>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        agent: Arc<VoiceAgent>,
        history: Arc<ConversationLogger>,
        rag: Arc<RagService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            agent,
            history,
            rag,
            transcript: Arc::new(RwLock::new(Conversation::new())),
            config,
        }
    }

    pub fn from_runtime(runtime: AgentRuntime) -> Self {
        Self::new(runtime.agent, runtime.history, runtime.rag, runtime.config)
    }
}
