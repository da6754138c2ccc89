use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form context attached to an interaction.
pub type EventContext = serde_json::Map<String, serde_json::Value>;

/// A user identifier restricted to alphanumerics, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Drop every character that is not alphanumeric, `-` or `_`.
    pub fn sanitize(raw: &str) -> Self {
        Self(
            raw.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Query,
    Command,
    IntegrationUse,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Query => "query",
            ActionKind::Command => "command",
            ActionKind::IntegrationUse => "integration_use",
        }
    }
}

/// One observed interaction. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub user_id: UserId,
    pub action: ActionKind,
    #[serde(default)]
    pub context: EventContext,
    pub timestamp: DateTime<Local>,
}

impl InteractionEvent {
    pub fn new(user_id: UserId, action: ActionKind, context: EventContext, timestamp: DateTime<Local>) -> Self {
        Self {
            user_id,
            action,
            context,
            timestamp,
        }
    }

    /// String value of a context key, if present and a string.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(|v| v.as_str())
    }
}

/// Source of "now" for everything that depends on the local hour.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant; used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    Formal,
    Neutral,
    Casual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Concise,
    Moderate,
    Detailed,
}

/// Reply style inferred from communication samples. Always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub formality: Formality,
    pub verbosity: Verbosity,
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            formality: Formality::Neutral,
            verbosity: Verbosity::Moderate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationSample {
    pub formality_score: i64,
    pub word_count: u64,
}
