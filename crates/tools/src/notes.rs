use attune_core::{CapabilityDescriptor, Clock, Error, EventContext, Result, SystemClock};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::CapabilityProvider;

const KEYWORDS: &[&str] = &["note", "notes", "reminder", "reminders", "write down", "remember", "memo", "memos"];

const CAPABILITIES: &[&str] = &["create_note", "search_notes", "update_note", "manage_notes"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl Note {
    fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower) || self.content.to_lowercase().contains(needle_lower)
    }
}

/// In-process note book searched by substring over title and content.
pub struct NotesProvider {
    descriptor: CapabilityDescriptor,
    notes: RwLock<Vec<Note>>,
    connected: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl Default for NotesProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NotesProvider {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            descriptor: CapabilityDescriptor::new("notes", KEYWORDS, CAPABILITIES),
            notes: RwLock::new(Vec::new()),
            connected: AtomicBool::new(false),
            clock,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn poisoned() -> Error {
        Error::Provider("notes lock poisoned".to_string())
    }

    /// Ids count up from 1 in insertion order.
    pub fn add_note(&self, title: &str, content: &str, tags: &[&str]) -> Result<Note> {
        let now = self.clock.now();
        let mut notes = self.notes.write().map_err(|_| Self::poisoned())?;
        let note = Note {
            id: notes.len() as u64 + 1,
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
            updated_at: now,
        };
        notes.push(note.clone());
        debug!(id = note.id, title = %title, "Added note");
        Ok(note)
    }

    /// Replace the non-empty fields given. `None` when the id is unknown.
    pub fn update_note(&self, id: u64, title: Option<&str>, content: Option<&str>) -> Result<Option<Note>> {
        let now = self.clock.now();
        let mut notes = self.notes.write().map_err(|_| Self::poisoned())?;
        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return Ok(None);
        };
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            note.title = title.to_string();
        }
        if let Some(content) = content.filter(|c| !c.is_empty()) {
            note.content = content.to_string();
        }
        note.updated_at = now;
        Ok(Some(note.clone()))
    }

    pub fn all_notes(&self) -> Result<Vec<Note>> {
        Ok(self.notes.read().map_err(|_| Self::poisoned())?.clone())
    }
}

impl CapabilityProvider for NotesProvider {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    fn connect(&self) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        info!("Notes connected");
        true
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!("Notes disconnected");
    }

    fn query(&self, text: &str, _context: &EventContext) -> Result<Value> {
        let needle = text.to_lowercase();
        let hits: Vec<Note> = self
            .notes
            .read()
            .map_err(|_| Self::poisoned())?
            .iter()
            .filter(|n| n.matches(&needle))
            .cloned()
            .collect();
        debug!(matches = hits.len(), "Notes query");
        Ok(serde_json::to_value(hits)?)
    }

    fn format_records(&self, records: &[Value]) -> String {
        let mut response = format!("Found {} note(s):\n", records.len());
        for record in records {
            let title = record.get("title").and_then(|v| v.as_str()).unwrap_or("Untitled");
            response.push_str(&format!("• {}\n", title));
        }
        response.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> EventContext {
        EventContext::new()
    }

    #[test]
    fn test_add_note_assigns_ids() {
        let notes = NotesProvider::new();
        assert_eq!(notes.name(), "notes");
        let first = notes.add_note("Test Note", "Test content", &["test"]).unwrap();
        let second = notes.add_note("Other", "", &[]).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.tags, vec!["test".to_string()]);
        assert_eq!(notes.all_notes().unwrap().len(), 2);
    }

    #[test]
    fn test_query_matches_title_or_content() {
        let notes = NotesProvider::new();
        notes.add_note("Shopping List", "Buy milk", &[]).unwrap();
        notes.add_note("Todo", "Finish project", &[]).unwrap();

        let hits = notes.query("shopping", &ctx()).unwrap();
        let hits = hits.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["title"], "Shopping List");

        let hits = notes.query("PROJECT", &ctx()).unwrap();
        assert_eq!(hits.as_array().unwrap()[0]["title"], "Todo");

        // Whole message is the needle
        assert_eq!(notes.query("show my shopping notes", &ctx()).unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_update_note() {
        let notes = NotesProvider::new();
        let note = notes.add_note("Original", "Original content", &[]).unwrap();

        let updated = notes.update_note(note.id, Some("Updated"), None).unwrap().unwrap();
        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.content, "Original content");

        let unchanged = notes.update_note(note.id, Some(""), None).unwrap().unwrap();
        assert_eq!(unchanged.title, "Updated");

        assert!(notes.update_note(99, Some("x"), None).unwrap().is_none());
    }

    #[test]
    fn test_format_records() {
        let notes = NotesProvider::new();
        notes.add_note("Milk", "buy milk", &[]).unwrap();
        notes.add_note("Oat milk", "", &[]).unwrap();
        let records = notes.query("milk", &ctx()).unwrap();
        assert_eq!(
            notes.format_records(records.as_array().unwrap()),
            "Found 2 note(s):\n• Milk\n• Oat milk"
        );
    }
}
