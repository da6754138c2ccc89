use attune_core::{Result, UserId, UserProfile};
use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::{info, warn};

use crate::documents::DocumentStoreHandle;

#[derive(Clone)]
pub struct ProfileStore {
    store: DocumentStoreHandle,
}

impl ProfileStore {
    pub fn new(store: DocumentStoreHandle) -> Self {
        Self { store }
    }

    fn key(user_id: &UserId) -> String {
        format!("profile_{}", user_id)
    }

    /// Existing profile, or a freshly saved one named `name`.
    pub fn load_or_create(&self, user_id: &UserId, name: &str, now: DateTime<Local>) -> Result<UserProfile> {
        if let Some(doc) = self.store.load(&Self::key(user_id))? {
            match serde_json::from_value::<UserProfile>(doc) {
                Ok(profile) => return Ok(profile),
                Err(e) => warn!(user_id = %user_id, error = %e, "Malformed profile, recreating"),
            }
        }

        let profile = UserProfile::new(user_id.clone(), name, now);
        self.save(&profile)?;
        info!(user_id = %user_id, "Created user profile");
        Ok(profile)
    }

    pub fn save(&self, profile: &UserProfile) -> Result<()> {
        let doc: Value = serde_json::to_value(profile)?;
        self.store.save(&Self::key(&profile.user_id), &doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentStore, InMemoryStore};
    use serde_json::json;

    #[test]
    fn test_load_or_create_persists() {
        let docs = InMemoryStore::handle();
        let store = ProfileStore::new(docs.clone());
        let user = UserId::sanitize("test_user");

        let created = store.load_or_create(&user, "Test User", Local::now()).unwrap();
        assert_eq!(created.name, "Test User");
        assert!(docs.load("profile_test_user").unwrap().is_some());

        // Second load keeps the stored name
        let again = store.load_or_create(&user, "Other", Local::now()).unwrap();
        assert_eq!(again.name, "Test User");
    }

    #[test]
    fn test_malformed_profile_is_recreated() {
        let docs = InMemoryStore::handle();
        docs.save("profile_alex", &json!({"name": 5})).unwrap();
        let store = ProfileStore::new(docs);
        let profile = store.load_or_create(&UserId::sanitize("alex"), "Alex", Local::now()).unwrap();
        assert_eq!(profile.name, "Alex");
    }
}
