use attune_core::{Error, Paths, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Whole-document persistence keyed by string. Callers always load, merge
/// and save the full document; there are no partial updates.
pub trait DocumentStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn save(&self, key: &str, doc: &Value) -> Result<()>;
}

pub type DocumentStoreHandle = Arc<dyn DocumentStore>;

/// One pretty-printed JSON file per key under `Paths::data_dir`.
pub struct JsonFileStore {
    paths: Paths,
}

impl JsonFileStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.paths.document_file(key);

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&content) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!(key = key, error = %e, "Unreadable document, treating as empty");
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, doc: &Value) -> Result<()> {
        let path = self.paths.document_file(key);

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write then rename so readers never observe a half-written file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        std::fs::rename(&tmp, &path)?;
        debug!(key = key, path = %path.display(), "Saved document");
        Ok(())
    }
}

/// Process-local store, used by tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryStore {
    docs: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle() -> DocumentStoreHandle {
        Arc::new(Self::new())
    }
}

impl DocumentStore for InMemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| Error::Storage("document store lock poisoned".to_string()))?;
        Ok(docs.get(key).cloned())
    }

    fn save(&self, key: &str, doc: &Value) -> Result<()> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| Error::Storage("document store lock poisoned".to_string()))?;
        docs.insert(key.to_string(), doc.clone());
        Ok(())
    }
}
