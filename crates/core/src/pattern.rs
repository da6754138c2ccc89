//! Per-user aggregate counters learned from interactions.
//!
//! Counters are created on demand through explicit get-or-insert operations
//! and keep the order in which keys were first seen, which is what breaks
//! ties when ranking.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::Result;
use crate::types::CommunicationSample;

/// String-keyed counter that remembers first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMap {
    entries: Vec<(String, u64)>,
}

impl CountMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `key`, inserting a zero count at the end if absent.
    pub fn get_or_insert_default(&mut self, key: &str) -> &mut u64 {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key.to_string(), 0));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Increment `key` by one and return the new count.
    pub fn bump(&mut self, key: &str) -> u64 {
        let slot = self.get_or_insert_default(key);
        *slot += 1;
        *slot
    }

    pub fn get(&self, key: &str) -> u64 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` highest counts; equal counts keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self.iter().collect();
        // sort_by is stable, so ties stay in insertion order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Lenient parse of a JSON object; entries that are not non-negative
    /// integers are skipped.
    pub fn from_json(value: &Value) -> Self {
        let mut map = Self::new();
        if let Some(obj) = value.as_object() {
            for (key, count) in obj {
                match count.as_u64() {
                    Some(c) => *map.get_or_insert_default(key) += c,
                    None => warn!(key = %key, value = %count, "Skipping non-integer count"),
                }
            }
        }
        map
    }
}

impl Serialize for CountMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, c) in &self.entries {
            map.serialize_entry(k, c)?;
        }
        map.end()
    }
}

/// Interaction counts per local hour of day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourCounts {
    counts: [u64; 24],
}

impl HourCounts {
    /// Increment the bucket for `hour` (taken modulo 24).
    pub fn bump(&mut self, hour: u32) -> u64 {
        let slot = &mut self.counts[(hour % 24) as usize];
        *slot += 1;
        *slot
    }

    pub fn get(&self, hour: u32) -> u64 {
        if hour < 24 {
            self.counts[hour as usize]
        } else {
            0
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Non-zero buckets in hour order.
    pub fn to_map(&self) -> BTreeMap<u32, u64> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(h, c)| (h as u32, *c))
            .collect()
    }

    /// Hour keys outside 0..=23 or non-integer counts are dropped.
    pub fn from_json(value: &Value) -> Self {
        let mut hours = Self::default();
        if let Some(obj) = value.as_object() {
            for (key, count) in obj {
                match (key.parse::<u32>().ok().filter(|h| *h < 24), count.as_u64()) {
                    (Some(h), Some(c)) => hours.counts[h as usize] += c,
                    _ => warn!(key = %key, "Dropping invalid hour bucket"),
                }
            }
        }
        hours
    }
}

impl Serialize for HourCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let buckets = self.to_map();
        let mut map = serializer.serialize_map(Some(buckets.len()))?;
        for (h, c) in buckets {
            map.serialize_entry(&h.to_string(), &c)?;
        }
        map.end()
    }
}

/// Everything learned about one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternState {
    pub common_queries: CountMap,
    pub preferred_times: HourCounts,
    pub topic_interests: CountMap,
    pub communication_samples: Vec<CommunicationSample>,
    pub decision_types: CountMap,
    pub decision_speeds: Vec<String>,
    pub detail_preferences: CountMap,
}

impl PatternState {
    /// Build state from a persisted document. Anything that is not a JSON
    /// object yields the empty state; malformed fields fall back to empty.
    pub fn from_document(doc: &Value) -> Self {
        let Some(obj) = doc.as_object() else {
            if !doc.is_null() {
                warn!("Pattern document is not an object, starting from empty state");
            }
            return Self::default();
        };

        let field = |name: &str| obj.get(name).cloned().unwrap_or(Value::Null);

        let communication_samples = match field("communication_samples") {
            Value::Null => Vec::new(),
            v => Vec::<CommunicationSample>::deserialize(&v).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding malformed communication samples");
                Vec::new()
            }),
        };
        let decision_speeds = match field("decision_speeds") {
            Value::Null => Vec::new(),
            v => Vec::<String>::deserialize(&v).unwrap_or_default(),
        };

        Self {
            common_queries: CountMap::from_json(&field("common_queries")),
            preferred_times: HourCounts::from_json(&field("preferred_times")),
            topic_interests: CountMap::from_json(&field("topic_interests")),
            communication_samples,
            decision_types: CountMap::from_json(&field("decision_types")),
            decision_speeds,
            detail_preferences: CountMap::from_json(&field("detail_preferences")),
        }
    }

    pub fn to_document(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
