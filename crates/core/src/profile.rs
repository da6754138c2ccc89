use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Explicit user preferences plus display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub preferences: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl UserProfile {
    pub fn new(user_id: UserId, name: &str, now: DateTime<Local>) -> Self {
        Self {
            user_id,
            name: name.to_string(),
            preferences: serde_json::Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge `updates` over the current preferences.
    pub fn merge_preferences(&mut self, updates: serde_json::Map<String, serde_json::Value>, now: DateTime<Local>) {
        for (key, value) in updates {
            self.preferences.insert(key, value);
        }
        self.updated_at = now;
    }
}
