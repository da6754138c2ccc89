use attune_core::EventContext;
use attune_tools::{CapabilityRegistry, ProviderHandle};
use serde_json::Value;
use tracing::{debug, warn};

/// What to do with a message no provider claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackIntent {
    Help,
    Suggest,
    Greet,
    Default,
}

impl FallbackIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackIntent::Help => "help",
            FallbackIntent::Suggest => "suggest",
            FallbackIntent::Greet => "greet",
            FallbackIntent::Default => "default",
        }
    }
}

#[derive(Clone)]
pub enum RoutingDecision {
    Provider(ProviderHandle),
    Fallback(FallbackIntent),
}

impl RoutingDecision {
    pub fn label(&self) -> &str {
        match self {
            RoutingDecision::Provider(p) => p.name(),
            RoutingDecision::Fallback(intent) => intent.as_str(),
        }
    }
}

impl std::fmt::Debug for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingDecision::Provider(p) => f.debug_tuple("Provider").field(&p.name()).finish(),
            RoutingDecision::Fallback(intent) => f.debug_tuple("Fallback").field(intent).finish(),
        }
    }
}

/// Provider output after the failure boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    Records(Vec<Value>),
    Scalar(String),
    Failed(String),
}

struct FallbackRule {
    intent: FallbackIntent,
    phrases: &'static [&'static str],
}

/// Keyword router: providers first, then fixed-priority fallback intents.
pub struct IntentRouter {
    rules: Vec<FallbackRule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    pub fn new() -> Self {
        // Checked in order, first hit wins
        let rules = vec![
            FallbackRule {
                intent: FallbackIntent::Help,
                phrases: &["help", "what can you do", "capabilities"],
            },
            FallbackRule {
                intent: FallbackIntent::Suggest,
                phrases: &["suggest", "recommendation", "what should"],
            },
            FallbackRule {
                intent: FallbackIntent::Greet,
                phrases: &["hello", "hi", "hey"],
            },
        ];
        Self { rules }
    }

    pub fn route(&self, registry: &CapabilityRegistry, message: &str) -> RoutingDecision {
        let lower = message.to_lowercase();
        if let Some(provider) = registry.find_by_keyword(&lower) {
            debug!(provider = %provider.name(), "Routed to provider");
            return RoutingDecision::Provider(provider.clone());
        }

        let intent = self.classify_fallback(&lower);
        debug!(intent = intent.as_str(), "Routed to fallback intent");
        RoutingDecision::Fallback(intent)
    }

    fn classify_fallback(&self, lower: &str) -> FallbackIntent {
        self.rules
            .iter()
            .find(|rule| rule.phrases.iter().any(|p| lower.contains(p)))
            .map(|rule| rule.intent)
            .unwrap_or(FallbackIntent::Default)
    }

    /// Run the provider; errors never escape.
    pub fn invoke(&self, provider: &ProviderHandle, message: &str, context: &EventContext) -> ProviderOutcome {
        match provider.query(message, context) {
            Ok(Value::Array(records)) => ProviderOutcome::Records(records),
            Ok(Value::String(s)) => ProviderOutcome::Scalar(s),
            Ok(other) => ProviderOutcome::Scalar(other.to_string()),
            Err(e) => {
                warn!(provider = %provider.name(), error = %e, "Provider query failed");
                ProviderOutcome::Failed(format!("I had trouble accessing your {}. Error: {}", provider.name(), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::{CapabilityDescriptor, Error, Result};
    use attune_tools::CapabilityProvider;
    use serde_json::json;
    use std::sync::Arc;

    struct Stub {
        descriptor: CapabilityDescriptor,
        answer: Option<Value>,
    }

    impl CapabilityProvider for Stub {
        fn descriptor(&self) -> &CapabilityDescriptor {
            &self.descriptor
        }

        fn query(&self, _text: &str, _context: &EventContext) -> Result<Value> {
            self.answer
                .clone()
                .ok_or_else(|| Error::Provider("backend offline".to_string()))
        }
    }

    fn stub(name: &str, keywords: &[&str], answer: Option<Value>) -> ProviderHandle {
        Arc::new(Stub {
            descriptor: CapabilityDescriptor::new(name, keywords, &[]),
            answer,
        })
    }

    fn registry() -> CapabilityRegistry {
        let mut reg = CapabilityRegistry::new();
        reg.register(stub("calendar", &["schedule", "calendar", "today"], Some(json!([])))).unwrap();
        reg.register(stub("notes", &["note"], Some(json!([])))).unwrap();
        reg
    }

    #[test]
    fn test_routing_is_case_insensitive() {
        let router = IntentRouter::new();
        let reg = registry();
        for msg in ["CALENDAR", "calendar", "Open my Calendar please", "What's my SCHEDULE?"] {
            assert_eq!(router.route(&reg, msg).label(), "calendar", "{}", msg);
        }
    }

    #[test]
    fn test_fallback_priority() {
        let router = IntentRouter::new();
        let reg = registry();
        assert_eq!(router.route(&reg, "hello, can you help?").label(), "help");
        assert_eq!(router.route(&reg, "Hey, any recommendation?").label(), "suggest");
        assert_eq!(router.route(&reg, "Hello").label(), "greet");
        assert_eq!(router.route(&reg, "The weather is nice").label(), "default");
        assert_eq!(router.route(&reg, "").label(), "default");
    }

    #[test]
    fn test_provider_beats_fallback() {
        let router = IntentRouter::new();
        let reg = registry();
        assert_eq!(router.route(&reg, "help me with my schedule").label(), "calendar");
    }

    #[test]
    fn test_empty_registry_uses_fallbacks() {
        let router = IntentRouter::new();
        let reg = CapabilityRegistry::new();
        assert!(matches!(
            router.route(&reg, "what's my schedule"),
            RoutingDecision::Fallback(FallbackIntent::Default)
        ));
    }

    #[test]
    fn test_invoke_failure_boundary() {
        let router = IntentRouter::new();
        let failing = stub("weather", &["weather"], None);
        let outcome = router.invoke(&failing, "weather", &EventContext::new());
        assert_eq!(
            outcome,
            ProviderOutcome::Failed(
                "I had trouble accessing your weather. Error: Provider error: backend offline".to_string()
            )
        );
    }

    #[test]
    fn test_invoke_shapes() {
        let router = IntentRouter::new();
        let ctx = EventContext::new();
        let records = stub("a", &["a"], Some(json!([{"title": "x"}])));
        let text = stub("b", &["b"], Some(json!("sunny")));
        let number = stub("c", &["c"], Some(json!(42)));

        assert!(matches!(router.invoke(&records, "", &ctx), ProviderOutcome::Records(r) if r.len() == 1));
        assert_eq!(router.invoke(&text, "", &ctx), ProviderOutcome::Scalar("sunny".to_string()));
        assert_eq!(router.invoke(&number, "", &ctx), ProviderOutcome::Scalar("42".to_string()));
    }
}
