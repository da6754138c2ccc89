use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One conversation transcript. Abandoned rather than closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub user_id: UserId,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl Conversation {
    pub fn new(user_id: UserId, now: DateTime<Local>) -> Self {
        Self {
            conversation_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, role: Role, content: &str, now: DateTime<Local>) {
        self.messages.push(Message {
            role,
            content: content.to_string(),
            timestamp: now,
            metadata: serde_json::Value::Null,
        });
        self.updated_at = now;
    }

    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}
