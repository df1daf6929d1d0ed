use serde::{Deserialize, Serialize};

use crate::model::search_result::SearchResult;

/// How long a topic has been around in the corpus.
///
/// `first_seen`/`last_seen` are `None` (and `dates` empty) for topics the
/// corpus has never seen; that is a valid answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTimeline {
    pub topic: String,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub days_seen: usize,
    pub dates: Vec<String>,
}

impl TopicTimeline {
    /// Build a timeline from an already sorted, de-duplicated date list.
    pub fn from_dates(topic: &str, dates: &[String]) -> Self {
        Self {
            topic: topic.to_string(),
            first_seen: dates.first().cloned(),
            last_seen: dates.last().cloned(),
            days_seen: dates.len(),
            dates: dates.to_vec(),
        }
    }
}

/// A search hit enriched with its timeline, ready for a downstream consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub topic: String,
    /// Score rounded to 4 decimal places.
    pub score: f32,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub days_seen: usize,
}

impl Ingredient {
    pub fn from_parts(hit: &SearchResult, timeline: &TopicTimeline) -> Self {
        Self {
            topic: hit.topic.clone(),
            score: round4(hit.score),
            first_seen: timeline.first_seen.clone(),
            last_seen: timeline.last_seen.clone(),
            days_seen: timeline.days_seen,
        }
    }
}

fn round4(x: f32) -> f32 {
    (x * 10_000.0).round() / 10_000.0
}

/// Per-topic summary written next to the embedding snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: String,
    pub first_seen: String,
    pub last_seen: String,
    pub days_seen: usize,
    /// Distinct `YYYY` prefixes of the topic's dates, ascending.
    pub years_active: Vec<String>,
    /// The first three dates the topic appeared on.
    pub example_dates: Vec<String>,
}

impl TopicSummary {
    /// Text that gets embedded for this topic when the snapshot is built.
    pub fn document(&self) -> String {
        format!(
            "Topic: {}\nFirst seen: {}\nLast seen: {}\nDays active: {}\nYears active: {}\n",
            self.topic,
            self.first_seen,
            self.last_seen,
            self.days_seen,
            self.years_active.join(", ")
        )
    }
}
