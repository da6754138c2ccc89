use attune_core::{PatternState, Result, UserId};
use chrono::{DateTime, Local};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::documents::DocumentStoreHandle;

/// Persists each user's `PatternState` as `{"patterns": .., "last_updated": ..}`.
#[derive(Clone)]
pub struct PatternStore {
    store: DocumentStoreHandle,
}

impl PatternStore {
    pub fn new(store: DocumentStoreHandle) -> Self {
        Self { store }
    }

    fn key(user_id: &UserId) -> String {
        format!("behavior_{}", user_id)
    }

    /// Load the user's state; missing or malformed documents give the empty state.
    pub fn load(&self, user_id: &UserId) -> Result<PatternState> {
        let state = match self.store.load(&Self::key(user_id))? {
            None => PatternState::default(),
            Some(Value::Object(doc)) => PatternState::from_document(doc.get("patterns").unwrap_or(&Value::Null)),
            Some(_) => {
                warn!(user_id = %user_id, "Behavior document is not an object, resetting patterns");
                PatternState::default()
            }
        };
        Ok(state)
    }

    /// Merge `state` into the stored document, keeping any unrelated keys.
    pub fn save(&self, user_id: &UserId, state: &PatternState, now: DateTime<Local>) -> Result<()> {
        let key = Self::key(user_id);
        let mut doc = match self.store.load(&key)? {
            Some(Value::Object(existing)) => existing,
            _ => serde_json::Map::new(),
        };
        doc.insert("patterns".to_string(), state.to_document()?);
        doc.insert("last_updated".to_string(), json!(now.to_rfc3339()));
        self.store.save(&key, &Value::Object(doc))?;
        debug!(user_id = %user_id, "Persisted behavior patterns");
        Ok(())
    }
}
