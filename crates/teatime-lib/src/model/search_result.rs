use serde::{Deserialize, Serialize};

/// A ranked topic produced by either the dense ranker or the lexical fallback.
///
/// `score` only carries ordering meaning: cosine similarity for dense hits,
/// a constant `1.0` for lexical hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub topic: String,
    pub score: f32,
}

impl SearchResult {
    pub fn new(topic: impl Into<String>, score: f32) -> Self {
        Self {
            topic: topic.into(),
            score,
        }
    }
}
