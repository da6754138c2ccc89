use attune_core::{CapabilityDescriptor, Clock, Error, EventContext, Result, SystemClock};
use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::CapabilityProvider;

const KEYWORDS: &[&str] = &[
    "schedule",
    "schedules",
    "calendar",
    "calendars",
    "event",
    "events",
    "meeting",
    "meetings",
    "appointment",
    "appointments",
    "today",
    "tomorrow",
];

const CAPABILITIES: &[&str] = &["view_schedule", "add_event", "query_events", "manage_calendar"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    #[serde(default)]
    pub description: String,
}

/// In-process calendar answering "today", "tomorrow" and "week" queries.
pub struct CalendarProvider {
    descriptor: CapabilityDescriptor,
    events: RwLock<Vec<CalendarEvent>>,
    connected: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl Default for CalendarProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarProvider {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            descriptor: CapabilityDescriptor::new("calendar", KEYWORDS, CAPABILITIES),
            events: RwLock::new(Vec::new()),
            connected: AtomicBool::new(false),
            clock,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn add_event(
        &self,
        title: &str,
        start: DateTime<Local>,
        end: DateTime<Local>,
        description: &str,
    ) -> Result<CalendarEvent> {
        if end < start {
            return Err(Error::Validation(format!("Event '{}' ends before it starts", title)));
        }
        let event = CalendarEvent {
            title: title.to_string(),
            start,
            end,
            description: description.to_string(),
        };
        self.events
            .write()
            .map_err(|_| Error::Provider("calendar lock poisoned".to_string()))?
            .push(event.clone());
        debug!(title = %title, start = %start, "Added calendar event");
        Ok(event)
    }

    pub fn events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self
            .events
            .read()
            .map_err(|_| Error::Provider("calendar lock poisoned".to_string()))?
            .clone())
    }

    /// Events starting on the calendar day of `day`.
    pub fn events_for_day(&self, day: DateTime<Local>) -> Result<Vec<CalendarEvent>> {
        let start = start_of_day(day);
        self.events_between(start, start + Duration::days(1))
    }

    /// Events from Monday midnight of the current week for seven days.
    pub fn events_for_week(&self) -> Result<Vec<CalendarEvent>> {
        let now = self.clock.now();
        let monday = now - Duration::days(i64::from(now.weekday().num_days_from_monday()));
        let start = start_of_day(monday);
        self.events_between(start, start + Duration::days(7))
    }

    fn events_between(&self, from: DateTime<Local>, to: DateTime<Local>) -> Result<Vec<CalendarEvent>> {
        Ok(self
            .events()?
            .into_iter()
            .filter(|e| from <= e.start && e.start < to)
            .collect())
    }
}

fn start_of_day(at: DateTime<Local>) -> DateTime<Local> {
    let midnight = at.date_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or(at)
}

fn display_start(record: &Value) -> String {
    match record.get("start").and_then(|v| v.as_str()) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => "Unknown time".to_string(),
    }
}

impl CapabilityProvider for CalendarProvider {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    fn connect(&self) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        info!("Calendar connected");
        true
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!("Calendar disconnected");
    }

    fn query(&self, text: &str, _context: &EventContext) -> Result<Value> {
        let lower = text.to_lowercase();
        let now = self.clock.now();
        let events = if lower.contains("today") {
            self.events_for_day(now)?
        } else if lower.contains("tomorrow") {
            self.events_for_day(now + Duration::days(1))?
        } else if lower.contains("week") {
            self.events_for_week()?
        } else {
            Vec::new()
        };
        debug!(matches = events.len(), "Calendar query");
        Ok(serde_json::to_value(events)?)
    }

    fn format_records(&self, records: &[Value]) -> String {
        let mut response = format!("You have {} event(s):\n", records.len());
        for record in records {
            let title = record.get("title").and_then(|v| v.as_str()).unwrap_or("Untitled");
            response.push_str(&format!("• {} at {}\n", title, display_start(record)));
        }
        response.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::FixedClock;

    // Wednesday 2024-05-15 10:00 local
    fn wednesday() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap()
    }

    fn calendar() -> CalendarProvider {
        CalendarProvider::with_clock(Arc::new(FixedClock(wednesday())))
    }

    fn ctx() -> EventContext {
        EventContext::new()
    }

    #[test]
    fn test_initial_state() {
        let cal = calendar();
        assert_eq!(cal.name(), "calendar");
        assert!(cal.events().unwrap().is_empty());
        assert!(!cal.is_connected());
        assert!(cal.connect());
        assert!(cal.is_connected());
        cal.disconnect();
        assert!(!cal.is_connected());
    }

    #[test]
    fn test_add_event_rejects_inverted_range() {
        let cal = calendar();
        let now = wednesday();
        assert!(cal.add_event("Backwards", now, now - Duration::hours(1), "").is_err());
        let event = cal.add_event("Standup", now, now + Duration::hours(1), "daily").unwrap();
        assert_eq!(event.title, "Standup");
        assert_eq!(cal.events().unwrap().len(), 1);
    }

    #[test]
    fn test_query_today_and_tomorrow() {
        let cal = calendar();
        let now = wednesday();
        cal.add_event("Today's Event", now, now + Duration::hours(1), "").unwrap();
        cal.add_event("Tomorrow's Event", now + Duration::days(1), now + Duration::days(1), "").unwrap();

        let today = cal.query("What's on today?", &ctx()).unwrap();
        let today = today.as_array().unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0]["title"], "Today's Event");

        let tomorrow = cal.query("tomorrow", &ctx()).unwrap();
        assert_eq!(tomorrow.as_array().unwrap()[0]["title"], "Tomorrow's Event");
    }

    #[test]
    fn test_query_week_starts_monday() {
        let cal = calendar();
        let monday = Local.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap();
        cal.add_event("Sunday before", monday - Duration::hours(1), monday, "").unwrap();
        cal.add_event("Monday", monday, monday + Duration::hours(1), "").unwrap();
        cal.add_event("Sunday", monday + Duration::days(6), monday + Duration::days(6), "").unwrap();
        cal.add_event("Next Monday", monday + Duration::days(7), monday + Duration::days(7), "").unwrap();

        let week = cal.query("this week", &ctx()).unwrap();
        let titles: Vec<&str> = week
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Monday", "Sunday"]);
    }

    #[test]
    fn test_unrecognized_query_is_empty() {
        let cal = calendar();
        let now = wednesday();
        cal.add_event("Standup", now, now, "").unwrap();
        assert_eq!(cal.query("show my schedule", &ctx()).unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_format_records() {
        let cal = calendar();
        let now = wednesday();
        cal.add_event("Standup", now, now, "").unwrap();
        let records = cal.query("today", &ctx()).unwrap();
        let text = cal.format_records(records.as_array().unwrap());
        assert_eq!(text, "You have 1 event(s):\n• Standup at 2024-05-15 10:00");
    }
}
