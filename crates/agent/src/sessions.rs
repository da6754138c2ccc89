use attune_core::config::ProvidersConfig;
use attune_core::{Clock, Config, Result, SystemClock, UserId};
use attune_storage::DocumentStoreHandle;
use attune_tools::{CalendarProvider, NotesProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::runtime::PersonalAssistant;

pub type AssistantHandle = Arc<Mutex<PersonalAssistant>>;

/// Per-user assistants for a long-running server. Each assistant sits behind
/// its own lock, so turns for one user run one at a time while other users
/// proceed.
pub struct AssistantSessions {
    docs: DocumentStoreHandle,
    config: Config,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<UserId, AssistantHandle>>,
}

impl AssistantSessions {
    pub fn new(docs: DocumentStoreHandle, config: Config) -> Self {
        Self::with_clock(docs, config, Arc::new(SystemClock))
    }

    pub fn with_clock(docs: DocumentStoreHandle, config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            docs,
            config,
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Existing assistant for `user_id`, or a new one with the configured
    /// providers attached. `user_name` only matters on first contact.
    pub async fn get_or_create(&self, user_id: &str, user_name: Option<&str>) -> Result<AssistantHandle> {
        let key = UserId::sanitize(user_id);
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(&key) {
            return Ok(handle.clone());
        }

        let assistant = build_assistant(
            user_id,
            user_name.unwrap_or(user_id),
            self.docs.clone(),
            &self.config.providers,
            self.clock.clone(),
        )?;
        let handle = Arc::new(Mutex::new(assistant));
        sessions.insert(key.clone(), handle.clone());
        info!(user_id = %key, active = sessions.len(), "Created assistant session");
        Ok(handle)
    }

    /// Build a fresh assistant for `user_id` with the given providers,
    /// replacing any existing session.
    pub async fn setup(
        &self,
        user_id: &str,
        user_name: Option<&str>,
        providers: &ProvidersConfig,
    ) -> Result<AssistantHandle> {
        let assistant = build_assistant(
            user_id,
            user_name.unwrap_or(user_id),
            self.docs.clone(),
            providers,
            self.clock.clone(),
        )?;
        let key = assistant.user_id().clone();
        let handle = Arc::new(Mutex::new(assistant));
        self.sessions.lock().await.insert(key.clone(), handle.clone());
        info!(user_id = %key, "Assistant session set up");
        Ok(handle)
    }

    pub async fn get(&self, user_id: &str) -> Option<AssistantHandle> {
        self.sessions.lock().await.get(&UserId::sanitize(user_id)).cloned()
    }

    pub async fn evict(&self, user_id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(&UserId::sanitize(user_id));
        if removed.is_some() {
            info!(user_id = %user_id, "Evicted assistant session");
        }
        removed.is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

/// An assistant with the enabled providers attached.
pub fn build_assistant(
    user_id: &str,
    user_name: &str,
    docs: DocumentStoreHandle,
    providers: &ProvidersConfig,
    clock: Arc<dyn Clock>,
) -> Result<PersonalAssistant> {
    let mut assistant = PersonalAssistant::with_clock(user_id, user_name, docs, clock.clone())?;
    if providers.calendar {
        assistant.add_provider(Arc::new(CalendarProvider::with_clock(clock.clone())))?;
    }
    if providers.notes {
        assistant.add_provider(Arc::new(NotesProvider::with_clock(clock)))?;
    }
    Ok(assistant)
}
