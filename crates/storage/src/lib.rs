pub mod conversations;
pub mod documents;
pub mod patterns;
pub mod profiles;

pub use conversations::ConversationStore;
pub use documents::{DocumentStore, DocumentStoreHandle, InMemoryStore, JsonFileStore};
pub use patterns::PatternStore;
pub use profiles::ProfileStore;
