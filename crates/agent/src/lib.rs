pub mod decision;
pub mod insights;
pub mod intent;
pub mod learner;
pub mod runtime;
pub mod sessions;
pub mod style;

pub use decision::{DecisionAction, DecisionPlanner, Opportunity, RewardLevel, RiskLevel, TeamMember, ThreatLevel};
pub use insights::ThinkingInsights;
pub use intent::{FallbackIntent, IntentRouter, ProviderOutcome, RoutingDecision};
pub use learner::{BehaviorLearner, LearnedPreferences};
pub use runtime::PersonalAssistant;
pub use sessions::{build_assistant, AssistantHandle, AssistantSessions};
pub use style::{KeywordFilter, PolicyFilter, PolicyVerdict, StyleAdapter};
