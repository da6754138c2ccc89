use attune_core::{CountMap, HourCounts, PatternState, StyleProfile};
use serde::Serialize;

use crate::style;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionPatterns {
    pub preferred_times: HourCounts,
    pub common_queries: CountMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionMaking {
    pub types: CountMap,
    pub speeds: Vec<String>,
    /// Most frequent speed sample; earliest wins ties.
    pub typical_speed: Option<String>,
}

/// A read-only summary of how a user communicates and decides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThinkingInsights {
    pub communication_style: StyleProfile,
    pub common_topics: CountMap,
    pub interaction_patterns: InteractionPatterns,
    pub decision_making: DecisionMaking,
    /// `"{query_type}:{detail}"` counts
    pub information_processing: CountMap,
}

impl ThinkingInsights {
    pub fn from_patterns(patterns: &PatternState) -> Self {
        let mut speed_counts = CountMap::new();
        for speed in &patterns.decision_speeds {
            speed_counts.bump(speed);
        }
        let typical_speed = speed_counts.top(1).first().map(|(s, _)| s.to_string());

        Self {
            communication_style: style::derive_style(&patterns.communication_samples),
            common_topics: patterns.topic_interests.clone(),
            interaction_patterns: InteractionPatterns {
                preferred_times: patterns.preferred_times.clone(),
                common_queries: patterns.common_queries.clone(),
            },
            decision_making: DecisionMaking {
                types: patterns.decision_types.clone(),
                speeds: patterns.decision_speeds.clone(),
                typical_speed,
            },
            information_processing: patterns.detail_preferences.clone(),
        }
    }
}
