use attune_core::{Conversation, Result, UserId};
use serde_json::Value;
use tracing::debug;

use crate::documents::DocumentStoreHandle;

/// Transcripts for one user, stored as a mapping of conversation id to
/// conversation.
#[derive(Clone)]
pub struct ConversationStore {
    store: DocumentStoreHandle,
}

impl ConversationStore {
    pub fn new(store: DocumentStoreHandle) -> Self {
        Self { store }
    }

    fn key(user_id: &UserId) -> String {
        format!("conversations_{}", user_id)
    }

    fn load_map(&self, user_id: &UserId) -> Result<serde_json::Map<String, Value>> {
        match self.store.load(&Self::key(user_id))? {
            Some(Value::Object(map)) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }

    /// Add or replace `conversation` in the user's document.
    pub fn save(&self, conversation: &Conversation) -> Result<()> {
        let mut map = self.load_map(&conversation.user_id)?;
        map.insert(
            conversation.conversation_id.clone(),
            serde_json::to_value(conversation)?,
        );
        self.store.save(&Self::key(&conversation.user_id), &Value::Object(map))?;
        debug!(
            conversation_id = %conversation.conversation_id,
            messages = conversation.messages.len(),
            "Saved conversation"
        );
        Ok(())
    }

    /// Up to `limit` conversations, most recently created first. Entries that
    /// fail to parse are skipped.
    pub fn history(&self, user_id: &UserId, limit: usize) -> Result<Vec<Conversation>> {
        let mut conversations: Vec<Conversation> = self
            .load_map(user_id)?
            .into_iter()
            .filter_map(|(id, v)| match serde_json::from_value::<Conversation>(v) {
                Ok(c) => Some(c),
                Err(e) => {
                    debug!(conversation_id = %id, error = %e, "Skipping unreadable conversation");
                    None
                }
            })
            .collect();

        conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        conversations.truncate(limit);
        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentStore, InMemoryStore};
    use attune_core::Role;
    use chrono::{Duration, Local};
    use serde_json::json;

    #[test]
    fn test_history_most_recent_first() {
        let store = ConversationStore::new(InMemoryStore::handle());
        let user = UserId::sanitize("alex");
        let base = Local::now();

        for offset in [0, 20, 10] {
            let mut conv = Conversation::new(user.clone(), base + Duration::seconds(offset));
            conv.add_message(Role::User, &format!("at {}", offset), base);
            store.save(&conv).unwrap();
        }

        let history = store.history(&user, 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].messages[0].content, "at 20");
        assert_eq!(history[1].messages[0].content, "at 10");
    }

    #[test]
    fn test_save_replaces_same_conversation() {
        let store = ConversationStore::new(InMemoryStore::handle());
        let user = UserId::sanitize("alex");
        let mut conv = Conversation::new(user.clone(), Local::now());
        store.save(&conv).unwrap();
        conv.add_message(Role::User, "again", Local::now());
        store.save(&conv).unwrap();

        let history = store.history(&user, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].messages.len(), 1);
    }

    #[test]
    fn test_malformed_document_gives_empty_history() {
        let docs = InMemoryStore::handle();
        docs.save("conversations_alex", &json!("broken")).unwrap();
        let store = ConversationStore::new(docs);
        assert!(store.history(&UserId::sanitize("alex"), 10).unwrap().is_empty());
    }
}
