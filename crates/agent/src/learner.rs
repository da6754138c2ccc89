use attune_core::{
    ActionKind, Clock, CommunicationSample, CountMap, EventContext, HourCounts, InteractionEvent, PatternState,
    Result, StyleProfile, UserId,
};
use attune_storage::PatternStore;
use chrono::Timelike;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::insights::ThinkingInsights;
use crate::style;

const MAX_QUERY_SUGGESTIONS: usize = 3;

/// Snapshot of the learned counters; detached from the learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnedPreferences {
    pub common_queries: CountMap,
    pub preferred_times: HourCounts,
    pub topic_interests: CountMap,
}

/// Turns interaction events into per-user aggregate statistics.
///
/// Every mutation is persisted before the call returns, so a fresh learner
/// for the same user sees it.
pub struct BehaviorLearner {
    user_id: UserId,
    store: PatternStore,
    clock: Arc<dyn Clock>,
    patterns: PatternState,
    history: Vec<InteractionEvent>,
}

impl BehaviorLearner {
    pub fn new(user_id: UserId, store: PatternStore, clock: Arc<dyn Clock>) -> Result<Self> {
        let patterns = store.load(&user_id)?;
        debug!(
            user_id = %user_id,
            queries = patterns.common_queries.len(),
            samples = patterns.communication_samples.len(),
            "Loaded behavior patterns"
        );
        Ok(Self {
            user_id,
            store,
            clock,
            patterns,
            history: Vec::new(),
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn patterns(&self) -> &PatternState {
        &self.patterns
    }

    /// The events recorded by this learner, oldest first.
    pub fn history(&self) -> &[InteractionEvent] {
        &self.history
    }

    /// Record an event stamped with the current time.
    pub fn record(&mut self, action: ActionKind, context: EventContext) -> Result<()> {
        let event = InteractionEvent::new(self.user_id.clone(), action, context, self.clock.now());
        self.record_event(event)
    }

    pub fn record_event(&mut self, event: InteractionEvent) -> Result<()> {
        if event.action == ActionKind::Query {
            let query_type = event.context_str("query_type").unwrap_or("general");
            self.patterns.common_queries.bump(query_type);
        }
        self.patterns.preferred_times.bump(event.timestamp.hour());
        if let Some(topic) = event.context.get("topic") {
            self.patterns.topic_interests.bump(&value_key(topic));
        }

        debug!(user_id = %self.user_id, action = event.action.as_str(), "Recorded interaction");
        self.history.push(event);
        self.persist()
    }

    /// Append a communication sample scored from `message`.
    pub fn record_communication(&mut self, message: &str) -> Result<CommunicationSample> {
        let sample = style::sample_message(message);
        self.patterns.communication_samples.push(sample);
        self.persist()?;
        Ok(sample)
    }

    /// Track a decision when the context carries a `decision` key. Returns
    /// whether anything was recorded.
    pub fn analyze_decision(&mut self, context: &EventContext) -> Result<bool> {
        if !context.contains_key("decision") {
            return Ok(false);
        }
        let decision_type = context.get("decision_type").map(value_key).unwrap_or_else(|| "unknown".to_string());
        let speed = context.get("decision_speed").map(value_key).unwrap_or_else(|| "moderate".to_string());
        self.patterns.decision_types.bump(&decision_type);
        self.patterns.decision_speeds.push(speed);
        self.persist()?;
        Ok(true)
    }

    pub fn record_detail_preference(&mut self, query_type: &str, detail: &str) -> Result<()> {
        self.patterns
            .detail_preferences
            .bump(&format!("{}:{}", query_type, detail));
        self.persist()
    }

    pub fn get_preferences(&self) -> LearnedPreferences {
        LearnedPreferences {
            common_queries: self.patterns.common_queries.clone(),
            preferred_times: self.patterns.preferred_times.clone(),
            topic_interests: self.patterns.topic_interests.clone(),
        }
    }

    pub fn get_suggestions(&self) -> Vec<String> {
        self.suggestions_at(self.clock.now().hour())
    }

    /// Top query types followed by one time-of-day hint for `hour`.
    pub fn suggestions_at(&self, hour: u32) -> Vec<String> {
        let mut suggestions: Vec<String> = self
            .patterns
            .common_queries
            .top(MAX_QUERY_SUGGESTIONS)
            .into_iter()
            .map(|(query_type, _)| format!("Check {}", query_type))
            .collect();

        let hint = match hour % 24 {
            6..=11 => "Review morning schedule",
            12..=17 => "Check afternoon tasks",
            _ => "Review tomorrow's plans",
        };
        suggestions.push(hint.to_string());
        suggestions
    }

    pub fn style_profile(&self) -> StyleProfile {
        style::derive_style(&self.patterns.communication_samples)
    }

    pub fn insights(&self) -> ThinkingInsights {
        ThinkingInsights::from_patterns(&self.patterns)
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.user_id, &self.patterns, self.clock.now())
    }
}

/// Counter key for a context value; strings are used verbatim.
fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::{FixedClock, Formality, Paths, Verbosity};
    use attune_storage::{InMemoryStore, JsonFileStore};
    use chrono::{Local, TimeZone};
    use serde_json::json;
    use tempfile::TempDir;

    fn clock_at(hour: u32) -> Arc<dyn Clock> {
        Arc::new(FixedClock(Local.with_ymd_and_hms(2024, 5, 15, hour, 30, 0).unwrap()))
    }

    fn learner() -> BehaviorLearner {
        BehaviorLearner::new(
            UserId::sanitize("alex"),
            PatternStore::new(InMemoryStore::handle()),
            clock_at(9),
        )
        .unwrap()
    }

    fn ctx(pairs: &[(&str, Value)]) -> EventContext {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_query_counting_is_exact() {
        let mut l = learner();
        for _ in 0..3 {
            l.record(ActionKind::Query, ctx(&[("query_type", json!("schedule"))])).unwrap();
        }
        l.record(ActionKind::Query, ctx(&[])).unwrap();
        l.record(ActionKind::Command, ctx(&[("query_type", json!("notes"))])).unwrap();

        let prefs = l.get_preferences();
        assert_eq!(prefs.common_queries.get("schedule"), 3);
        assert_eq!(prefs.common_queries.get("general"), 1);
        // Commands never count as queries
        assert_eq!(prefs.common_queries.get("notes"), 0);
        assert_eq!(prefs.preferred_times.get(9), 5);
        assert_eq!(l.history().len(), 5);
    }

    #[test]
    fn test_topics_counted() {
        let mut l = learner();
        l.record(ActionKind::IntegrationUse, ctx(&[("topic", json!("travel"))])).unwrap();
        l.record(ActionKind::Query, ctx(&[("topic", json!("travel"))])).unwrap();
        assert_eq!(l.get_preferences().topic_interests.get("travel"), 2);
    }

    #[test]
    fn test_suggestion_hour_boundaries() {
        let l = learner();
        let hint = |hour: u32| l.suggestions_at(hour).pop().unwrap();
        assert_eq!(hint(5), "Review tomorrow's plans");
        assert_eq!(hint(6), "Review morning schedule");
        assert_eq!(hint(11), "Review morning schedule");
        assert_eq!(hint(12), "Check afternoon tasks");
        assert_eq!(hint(17), "Check afternoon tasks");
        assert_eq!(hint(18), "Review tomorrow's plans");
        assert_eq!(hint(23), "Review tomorrow's plans");
        assert_eq!(hint(0), "Review tomorrow's plans");
        assert_eq!(hint(24), "Review tomorrow's plans");
    }

    #[test]
    fn test_suggestions_rank_queries() {
        let mut l = learner();
        for query_type in ["notes", "schedule", "schedule", "weather", "email", "email"] {
            l.record(ActionKind::Query, ctx(&[("query_type", json!(query_type))])).unwrap();
        }
        assert_eq!(
            l.get_suggestions(),
            vec![
                "Check schedule".to_string(),
                "Check email".to_string(),
                "Check notes".to_string(),
                "Review morning schedule".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_learner_has_single_hint() {
        assert_eq!(learner().suggestions_at(13), vec!["Check afternoon tasks".to_string()]);
    }

    #[test]
    fn test_style_from_communication() {
        let mut l = learner();
        assert_eq!(l.style_profile(), StyleProfile::default());
        l.record_communication("hey yeah gonna").unwrap();
        l.record_communication("hey wanna go").unwrap();
        let style = l.style_profile();
        assert_eq!(style.formality, Formality::Casual);
        assert_eq!(style.verbosity, Verbosity::Concise);
    }

    #[test]
    fn test_decision_and_detail_tracking() {
        let mut l = learner();
        assert!(!l.analyze_decision(&ctx(&[("decision_type", json!("career"))])).unwrap());
        assert!(l
            .analyze_decision(&ctx(&[("decision", json!(true)), ("decision_type", json!("career"))]))
            .unwrap());
        assert!(l.analyze_decision(&ctx(&[("decision", json!(true))])).unwrap());
        l.record_detail_preference("schedule", "high").unwrap();

        let p = l.patterns();
        assert_eq!(p.decision_types.get("career"), 1);
        assert_eq!(p.decision_types.get("unknown"), 1);
        assert_eq!(p.decision_speeds, vec!["moderate".to_string(), "moderate".to_string()]);
        assert_eq!(p.detail_preferences.get("schedule:high"), 1);
    }

    #[test]
    fn test_persisted_state_survives_reload() {
        let tmp = TempDir::new().unwrap();
        let paths = Paths::with_base(tmp.path().to_path_buf());
        let docs: attune_storage::DocumentStoreHandle = Arc::new(JsonFileStore::new(paths));
        let user = UserId::sanitize("alex");

        let mut first = BehaviorLearner::new(user.clone(), PatternStore::new(docs.clone()), clock_at(14)).unwrap();
        first.record(ActionKind::Query, ctx(&[("query_type", json!("schedule"))])).unwrap();
        first.record_communication("Please help").unwrap();

        let second = BehaviorLearner::new(user, PatternStore::new(docs.clone()), clock_at(14)).unwrap();
        assert_eq!(second.get_preferences(), first.get_preferences());
        assert_eq!(second.patterns().communication_samples.len(), 1);
        // Event log is process-local
        assert!(second.history().is_empty());
        assert!(docs.load("behavior_alex").unwrap().is_some());
    }
}
