use attune_core::{
    ActionKind, CapabilityDescriptor, Clock, Conversation, Error, EventContext, Result, Role, SystemClock, UserId,
    UserProfile,
};
use attune_storage::{ConversationStore, DocumentStoreHandle, PatternStore, ProfileStore};
use attune_tools::{CapabilityRegistry, ProviderHandle};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::intent::{FallbackIntent, IntentRouter, ProviderOutcome, RoutingDecision};
use crate::learner::{BehaviorLearner, LearnedPreferences};
use crate::style::{PolicyVerdict, StyleAdapter};

const GENERAL_CAPABILITIES: &[&str] = &[
    "Learn from your behavior patterns",
    "Provide personalized suggestions",
    "Adapt to your preferences",
];

/// One user's assistant: routes each message, learns from it, and replies in
/// the user's style.
pub struct PersonalAssistant {
    user_id: UserId,
    user_name: String,
    profile: UserProfile,
    registry: CapabilityRegistry,
    router: IntentRouter,
    style: StyleAdapter,
    learner: BehaviorLearner,
    conversations: ConversationStore,
    profiles: ProfileStore,
    conversation: Option<Conversation>,
    clock: Arc<dyn Clock>,
}

impl PersonalAssistant {
    pub fn new(user_id: &str, user_name: &str, docs: DocumentStoreHandle) -> Result<Self> {
        Self::with_clock(user_id, user_name, docs, Arc::new(SystemClock))
    }

    /// Load (or create) the user's profile and learned patterns. An empty
    /// `user_name` falls back to the user id.
    pub fn with_clock(user_id: &str, user_name: &str, docs: DocumentStoreHandle, clock: Arc<dyn Clock>) -> Result<Self> {
        let user_id = UserId::sanitize(user_id);
        if user_id.is_empty() {
            return Err(Error::Validation("user id has no usable characters".to_string()));
        }
        let user_name = if user_name.trim().is_empty() {
            user_id.to_string()
        } else {
            user_name.trim().to_string()
        };

        let profiles = ProfileStore::new(docs.clone());
        let profile = profiles.load_or_create(&user_id, &user_name, clock.now())?;
        let learner = BehaviorLearner::new(user_id.clone(), PatternStore::new(docs.clone()), clock.clone())?;
        info!(user_id = %user_id, "Assistant ready");

        Ok(Self {
            user_id,
            user_name,
            profile,
            registry: CapabilityRegistry::new(),
            router: IntentRouter::new(),
            style: StyleAdapter::new(),
            learner,
            conversations: ConversationStore::new(docs),
            profiles,
            conversation: None,
            clock,
        })
    }

    pub fn set_style_adapter(&mut self, style: StyleAdapter) {
        self.style = style;
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn learner(&self) -> &BehaviorLearner {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut BehaviorLearner {
        &mut self.learner
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Connect and register a provider. `Ok(false)` when it refuses to
    /// connect; a duplicate name is a configuration error.
    pub fn add_provider(&mut self, provider: ProviderHandle) -> Result<bool> {
        if self.registry.get(provider.name()).is_some() {
            return Err(Error::DuplicateName(provider.name().to_string()));
        }
        if !provider.connect() {
            warn!(provider = %provider.name(), "Provider failed to connect");
            return Ok(false);
        }
        info!(provider = %provider.name(), "Provider connected");
        self.registry.register(provider)?;
        Ok(true)
    }

    /// Disconnect and drop a provider. Unknown names are ignored.
    pub fn remove_provider(&mut self, name: &str) -> bool {
        match self.registry.unregister(name) {
            Some(provider) => {
                provider.disconnect();
                info!(provider = %name, "Provider removed");
                true
            }
            None => false,
        }
    }

    /// Begin a fresh transcript, replacing any current one.
    pub fn start_conversation(&mut self) -> String {
        let conversation = Conversation::new(self.user_id.clone(), self.clock.now());
        let id = conversation.conversation_id.clone();
        debug!(conversation_id = %id, "Started conversation");
        self.conversation = Some(conversation);
        id
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.conversation_id.as_str())
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Handle one user turn and return the styled reply. Starts a
    /// conversation when none is active.
    pub fn chat(&mut self, message: &str, context: EventContext) -> Result<String> {
        let now = self.clock.now();
        let mut conversation = self
            .conversation
            .take()
            .unwrap_or_else(|| Conversation::new(self.user_id.clone(), now));
        conversation.add_message(Role::User, message, now);

        let result = self.complete_turn(&mut conversation, message, context);
        self.conversation = Some(conversation);
        result
    }

    fn complete_turn(&mut self, conversation: &mut Conversation, message: &str, context: EventContext) -> Result<String> {
        let mut event_context = context.clone();
        event_context.insert("message".to_string(), Value::String(message.to_string()));
        self.learner.record(ActionKind::Query, event_context)?;

        let candidate = match self.style.apply_policy_filters(message) {
            PolicyVerdict::Rejected(reason) => {
                info!(user_id = %self.user_id, reason = %reason, "Message rejected");
                reason
            }
            PolicyVerdict::Accepted => self.respond(message, &context),
        };
        let reply = self.style.rewrite(&candidate, self.learner.style_profile());

        conversation.add_message(Role::Assistant, &reply, self.clock.now());
        self.learner.record_communication(message)?;
        self.conversations.save(conversation)?;
        Ok(reply)
    }

    fn respond(&self, message: &str, context: &EventContext) -> String {
        match self.router.route(&self.registry, message) {
            RoutingDecision::Provider(provider) => match self.router.invoke(&provider, message, context) {
                ProviderOutcome::Records(records) if records.is_empty() => {
                    format!("I didn't find anything in your {}.", provider.name())
                }
                ProviderOutcome::Records(records) => provider.format_records(&records),
                ProviderOutcome::Scalar(text) => text,
                ProviderOutcome::Failed(apology) => apology,
            },
            RoutingDecision::Fallback(FallbackIntent::Help) => self.capabilities_message(),
            RoutingDecision::Fallback(FallbackIntent::Suggest) => {
                let mut text = "Based on your usage patterns, here are some suggestions:".to_string();
                for suggestion in self.learner.get_suggestions() {
                    text.push_str(&format!("\n• {}", suggestion));
                }
                text
            }
            RoutingDecision::Fallback(FallbackIntent::Greet) => {
                format!("Hello {}! How can I assist you today?", self.user_name)
            }
            RoutingDecision::Fallback(FallbackIntent::Default) => format!(
                "I'm here to help, {}. You can ask me about your schedule, notes, or other connected services. Say 'help' to see what I can do!",
                self.user_name
            ),
        }
    }

    fn capabilities_message(&self) -> String {
        let mut lines = vec!["I'm your personal assistant! I can help you with:".to_string()];
        for provider in self.registry.iter() {
            lines.push(format!("\n{}:", provider.descriptor().display_name()));
            for capability in provider.capabilities() {
                lines.push(format!("  • {}", CapabilityDescriptor::display_capability(capability)));
            }
        }
        lines.push("\nGeneral:".to_string());
        lines.extend(GENERAL_CAPABILITIES.iter().map(|c| format!("  • {}", c)));
        lines.join("\n")
    }

    /// Saved conversations, most recently started first.
    pub fn conversation_history(&self, limit: usize) -> Result<Vec<Conversation>> {
        self.conversations.history(&self.user_id, limit)
    }

    pub fn update_preferences(&mut self, updates: serde_json::Map<String, Value>) -> Result<()> {
        self.profile.merge_preferences(updates, self.clock.now());
        self.profiles.save(&self.profile)
    }

    pub fn get_suggestions(&self) -> Vec<String> {
        self.learner.get_suggestions()
    }

    pub fn get_preferences(&self) -> LearnedPreferences {
        self.learner.get_preferences()
    }
}
