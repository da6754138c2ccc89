pub mod chat;
pub mod gateway;
pub mod profile;
pub mod status;

use attune_agent::{build_assistant, PersonalAssistant};
use attune_core::{Config, Paths, SystemClock};
use attune_storage::{DocumentStoreHandle, JsonFileStore};
use std::sync::Arc;

/// Paths, effective config and the on-disk document store.
pub struct AppContext {
    pub paths: Paths,
    pub config: Config,
    pub docs: DocumentStoreHandle,
}

impl AppContext {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Paths::new())
    }

    pub fn load_from(paths: Paths) -> anyhow::Result<Self> {
        let mut config = Config::load_or_default(&paths)?;
        config.apply_env_overrides();
        let docs: DocumentStoreHandle = Arc::new(JsonFileStore::new(paths.clone()));
        Ok(Self { paths, config, docs })
    }

    /// Command-line values win over config.
    pub fn resolve_user(&self, user: Option<String>, name: Option<String>) -> (String, String) {
        let user_id = user.unwrap_or_else(|| self.config.assistant.default_user_id.clone());
        let name = name.unwrap_or_else(|| self.config.assistant.default_user_name.clone());
        (user_id, name)
    }

    pub fn assistant(&self, user: Option<String>, name: Option<String>) -> anyhow::Result<PersonalAssistant> {
        let (user_id, name) = self.resolve_user(user, name);
        let assistant = build_assistant(
            &user_id,
            &name,
            self.docs.clone(),
            &self.config.providers,
            Arc::new(SystemClock),
        )?;
        Ok(assistant)
    }
}
