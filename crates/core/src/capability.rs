use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a capability provider declares about itself at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Unique provider name, also the registry key
    pub name: String,
    /// Lower-case words or phrases that route a message to this provider
    pub trigger_keywords: BTreeSet<String>,
    /// Capabilities in declaration order, e.g. `view_schedule`
    pub capabilities: Vec<String>,
}

impl CapabilityDescriptor {
    pub fn new(name: &str, keywords: &[&str], capabilities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            trigger_keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// `view_schedule` -> `View Schedule`
    pub fn display_capability(capability: &str) -> String {
        title_case(&capability.replace('_', " "))
    }

    pub fn display_name(&self) -> String {
        title_case(&self.name)
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_creation() {
        let desc = CapabilityDescriptor::new("calendar", &["Schedule", "meeting"], &["view_schedule"]);
        assert!(desc.trigger_keywords.contains("schedule"));
        assert_eq!(desc.capabilities, vec!["view_schedule".to_string()]);
        assert_eq!(desc.display_name(), "Calendar");
    }

    #[test]
    fn test_display_capability() {
        assert_eq!(CapabilityDescriptor::display_capability("manage_calendar"), "Manage Calendar");
        assert_eq!(CapabilityDescriptor::display_capability("add_EVENT"), "Add Event");
    }
}
