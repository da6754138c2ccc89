pub mod calendar;
pub mod notes;
pub mod registry;

use attune_core::{CapabilityDescriptor, EventContext, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

pub use calendar::CalendarProvider;
pub use notes::NotesProvider;
pub use registry::CapabilityRegistry;

/// Shared handle to a registered provider.
pub type ProviderHandle = Arc<dyn CapabilityProvider>;

/// A named source of answers the router can dispatch a message to.
///
/// Providers are opaque to the rest of the system: they are looked up by
/// name or keyword and observed only through their return values.
pub trait CapabilityProvider: Send + Sync {
    fn descriptor(&self) -> &CapabilityDescriptor;

    /// Answer `text`. Record lists are returned as a JSON array, anything
    /// else is treated as a scalar answer.
    fn query(&self, text: &str, context: &EventContext) -> Result<Value>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn trigger_keywords(&self) -> &BTreeSet<String> {
        &self.descriptor().trigger_keywords
    }

    fn capabilities(&self) -> &[String] {
        &self.descriptor().capabilities
    }

    /// Establish the backing connection. Returning `false` keeps the
    /// provider out of the registry.
    fn connect(&self) -> bool {
        true
    }

    fn disconnect(&self) {}

    /// Render a non-empty record list as reply text.
    fn format_records(&self, records: &[Value]) -> String {
        let mut response = format!("Found {} item(s):\n", records.len());
        for record in records {
            let title = record.get("title").and_then(|v| v.as_str()).unwrap_or("Untitled");
            response.push_str(&format!("• {}\n", title));
        }
        response.trim_end().to_string()
    }
}
