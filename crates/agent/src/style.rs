//! Reply style inference, rewriting, and content screening.

use attune_core::{CommunicationSample, Formality, StyleProfile, Verbosity};
use std::sync::Arc;
use tracing::debug;

const FORMAL_MARKERS: &[&str] = &["please", "thank you", "kindly", "regards"];
const CASUAL_MARKERS: &[&str] = &["hey", "yeah", "gonna", "wanna"];

const CASUAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("Hello", "Hey"),
    ("please ", ""),
    ("please", ""),
    ("Thank you", "Thanks"),
];
const FORMAL_SUBSTITUTIONS: &[(&str, &str)] = &[("Hey", "Hello"), ("Thanks", "Thank you")];

const CONCISE_WORD_LIMIT: usize = 50;
const CONCISE_SEGMENTS: usize = 3;

/// Formal markers present minus casual markers present. Each marker counts
/// at most once.
pub fn score_formality(message: &str) -> i64 {
    let lower = message.to_lowercase();
    let count = |markers: &[&str]| markers.iter().filter(|m| lower.contains(*m)).count() as i64;
    count(FORMAL_MARKERS) - count(CASUAL_MARKERS)
}

pub fn sample_message(message: &str) -> CommunicationSample {
    CommunicationSample {
        formality_score: score_formality(message),
        word_count: message.split_whitespace().count() as u64,
    }
}

/// Mean formality above 1 is formal, below -1 casual. Mean word count above
/// 30 is detailed, below 10 concise.
pub fn derive_style(samples: &[CommunicationSample]) -> StyleProfile {
    if samples.is_empty() {
        return StyleProfile::default();
    }
    let n = samples.len() as f64;
    let mean_formality = samples.iter().map(|s| s.formality_score as f64).sum::<f64>() / n;
    let mean_words = samples.iter().map(|s| s.word_count as f64).sum::<f64>() / n;

    let formality = if mean_formality > 1.0 {
        Formality::Formal
    } else if mean_formality < -1.0 {
        Formality::Casual
    } else {
        Formality::Neutral
    };
    let verbosity = if mean_words > 30.0 {
        Verbosity::Detailed
    } else if mean_words < 10.0 {
        Verbosity::Concise
    } else {
        Verbosity::Moderate
    };
    StyleProfile { formality, verbosity }
}

/// Apply the style's literal substitutions. For concise users, replies over
/// fifty words are then cut to their first three ". " segments plus a
/// period. The cut is lossy and irreversible: later segments are dropped,
/// not summarized.
pub fn rewrite(text: &str, style: StyleProfile) -> String {
    let substitutions: &[(&str, &str)] = match style.formality {
        Formality::Casual => CASUAL_SUBSTITUTIONS,
        Formality::Formal => FORMAL_SUBSTITUTIONS,
        Formality::Neutral => &[],
    };
    let mut adapted = substitutions
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to));

    if style.verbosity == Verbosity::Concise && adapted.split_whitespace().count() > CONCISE_WORD_LIMIT {
        let kept: Vec<&str> = adapted.split(". ").take(CONCISE_SEGMENTS).collect();
        adapted = format!("{}.", kept.join(". "));
        debug!("Truncated reply for concise style");
    }
    adapted
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVerdict {
    Accepted,
    Rejected(String),
}

impl PolicyVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PolicyVerdict::Accepted)
    }
}

/// A content screen run over the raw user message.
pub trait PolicyFilter: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, message: &str) -> PolicyVerdict;
}

/// Rejects any message containing one of its phrases as a substring.
pub struct KeywordFilter {
    name: &'static str,
    phrases: &'static [&'static str],
    reason: &'static str,
}

impl KeywordFilter {
    pub fn ethical() -> Self {
        Self {
            name: "ethical",
            phrases: &[
                "illegal",
                "harm",
                "attack",
                "weapon",
                "violence",
                "abuse",
                "exploit",
                "manipulate",
                "deceive",
            ],
            reason: "Request may violate ethical guidelines",
        }
    }

    pub fn legal() -> Self {
        Self {
            name: "legal",
            phrases: &["copyright infringement", "piracy", "hack", "crack", "steal", "fraud", "scam"],
            reason: "Request may violate legal boundaries",
        }
    }
}

impl PolicyFilter for KeywordFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn check(&self, message: &str) -> PolicyVerdict {
        let lower = message.to_lowercase();
        match self.phrases.iter().find(|p| lower.contains(*p)) {
            Some(hit) => {
                debug!(filter = self.name, phrase = *hit, "Message rejected by policy filter");
                PolicyVerdict::Rejected(self.reason.to_string())
            }
            None => PolicyVerdict::Accepted,
        }
    }
}

/// Ordered filter chain; the first rejection wins.
#[derive(Clone)]
pub struct StyleAdapter {
    filters: Vec<Arc<dyn PolicyFilter>>,
}

impl Default for StyleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleAdapter {
    pub fn new() -> Self {
        Self::with_filters(vec![Arc::new(KeywordFilter::ethical()), Arc::new(KeywordFilter::legal())])
    }

    pub fn with_filters(filters: Vec<Arc<dyn PolicyFilter>>) -> Self {
        Self { filters }
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn apply_policy_filters(&self, message: &str) -> PolicyVerdict {
        self.filters
            .iter()
            .map(|f| f.check(message))
            .find(|v| !v.is_accepted())
            .unwrap_or(PolicyVerdict::Accepted)
    }

    pub fn derive_style(&self, samples: &[CommunicationSample]) -> StyleProfile {
        derive_style(samples)
    }

    pub fn rewrite(&self, text: &str, style: StyleProfile) -> String {
        rewrite(text, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(formality_score: i64, word_count: u64) -> CommunicationSample {
        CommunicationSample {
            formality_score,
            word_count,
        }
    }

    #[test]
    fn test_derive_style_defaults() {
        assert_eq!(derive_style(&[]), StyleProfile::default());
        assert_eq!(
            derive_style(&[sample(0, 15)]),
            StyleProfile {
                formality: Formality::Neutral,
                verbosity: Verbosity::Moderate
            }
        );
    }

    #[test]
    fn test_derive_style_thresholds() {
        // Exactly 1 and -1 stay neutral; 30 and 10 stay moderate
        assert_eq!(derive_style(&[sample(1, 30)]), StyleProfile::default());
        assert_eq!(derive_style(&[sample(-1, 10)]), StyleProfile::default());

        let formal = derive_style(&[sample(2, 31), sample(1, 40)]);
        assert_eq!(formal.formality, Formality::Formal);
        assert_eq!(formal.verbosity, Verbosity::Detailed);

        let casual = derive_style(&[sample(-2, 3), sample(-2, 5)]);
        assert_eq!(casual.formality, Formality::Casual);
        assert_eq!(casual.verbosity, Verbosity::Concise);
    }

    #[test]
    fn test_score_formality() {
        assert_eq!(score_formality("Please, kindly send it. Thank you. Regards"), 4);
        assert_eq!(score_formality("hey yeah gonna do it"), -3);
        assert_eq!(score_formality("Hello"), 0);
        // Markers count once
        assert_eq!(score_formality("please please please"), 1);
    }

    #[test]
    fn test_sample_message() {
        assert_eq!(sample_message("  hey   there  "), sample(-1, 2));
    }

    #[test]
    fn test_rewrite_casual_and_formal() {
        let casual = StyleProfile {
            formality: Formality::Casual,
            verbosity: Verbosity::Moderate,
        };
        assert_eq!(rewrite("Hello! Thank you, please wait.", casual), "Hey! Thanks, wait.");

        let formal = StyleProfile {
            formality: Formality::Formal,
            verbosity: Verbosity::Moderate,
        };
        assert_eq!(rewrite("Hey, Thanks!", formal), "Hello, Thank you!");
        assert_eq!(rewrite("Hey, Thanks!", StyleProfile::default()), "Hey, Thanks!");
    }

    #[test]
    fn test_concise_truncation() {
        let concise = StyleProfile {
            formality: Formality::Neutral,
            verbosity: Verbosity::Concise,
        };
        let sentence = "one two three four five six seven eight nine ten";
        let long = vec![sentence; 6].join(". ") + ".";
        let cut = rewrite(&long, concise);
        assert_eq!(cut, vec![sentence; 3].join(". ") + ".");

        // Short text is untouched
        assert_eq!(rewrite("Short. Reply", concise), "Short. Reply");
    }

    #[test]
    fn test_concise_word_limit_boundary() {
        let concise = StyleProfile {
            formality: Formality::Neutral,
            verbosity: Verbosity::Concise,
        };
        let sentence = "one two three four five six seven eight nine ten";
        let fifty = vec![sentence; 5].join(". ");
        assert_eq!(fifty.split_whitespace().count(), 50);
        assert_eq!(rewrite(&fifty, concise), fifty);

        let fifty_one = format!("{} eleven", fifty);
        assert_eq!(rewrite(&fifty_one, concise), vec![sentence; 3].join(". ") + ".");
    }

    #[test]
    fn test_concise_truncation_keeps_segment_text() {
        let concise = StyleProfile {
            formality: Formality::Neutral,
            verbosity: Verbosity::Concise,
        };
        let sentence = "one two three four five six seven eight nine ten";
        let text = format!("{s}. {s}. {s} and so on.... {s}. {s}. {s}", s = sentence);
        assert_eq!(
            rewrite(&text, concise),
            format!("{s}. {s}. {s} and so on....", s = sentence)
        );
    }

    #[test]
    fn test_policy_filters_order() {
        let adapter = StyleAdapter::new();
        assert_eq!(adapter.filter_names(), vec!["ethical", "legal"]);
        assert_eq!(adapter.apply_policy_filters("what's on my schedule"), PolicyVerdict::Accepted);
        assert_eq!(
            adapter.apply_policy_filters("hack my schedule"),
            PolicyVerdict::Rejected("Request may violate legal boundaries".to_string())
        );
        // Both lists hit; ethical wins
        assert_eq!(
            adapter.apply_policy_filters("illegal piracy"),
            PolicyVerdict::Rejected("Request may violate ethical guidelines".to_string())
        );
        // Substring heuristic over-triggers
        assert!(!adapter.apply_policy_filters("Charming idea").is_accepted());
    }

    #[test]
    fn test_custom_filter_chain() {
        struct Block;
        impl PolicyFilter for Block {
            fn name(&self) -> &str {
                "block"
            }
            fn check(&self, _message: &str) -> PolicyVerdict {
                PolicyVerdict::Rejected("blocked".to_string())
            }
        }
        let adapter = StyleAdapter::with_filters(vec![Arc::new(Block)]);
        assert_eq!(adapter.apply_policy_filters("hi"), PolicyVerdict::Rejected("blocked".to_string()));
        assert!(StyleAdapter::with_filters(vec![]).apply_policy_filters("hack").is_accepted());
    }
}
