use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// One answered query, as kept in the semantic history collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: u64,
    pub query: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(id: u64, query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id,
            query: query.into(),
            response: response.into(),
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> String {
        format!("conv{}", self.id)
    }

    /// The stored text is the response, so recall hands back answers.
    pub fn to_record(&self) -> Record {
        Record {
            id: self.id,
            key: self.key(),
            text: self.response.clone(),
            metadata: serde_json::json!({
                "query": self.query,
                "response": self.response,
                "created_at": self.created_at,
            }),
        }
    }
}

/// Displayable transcript of the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self.updated_at = Utc::now();
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }

    /// One `Speaker: text` line per message, oldest first.
    pub fn format_history(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}\n", m.role.as_str(), m.content))
            .collect()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Agent => "Agent",
        }
    }
}
