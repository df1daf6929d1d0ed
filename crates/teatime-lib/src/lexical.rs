//! Lexical fallback: case-insensitive substring match of query tokens against
//! topic names. Relevance is binary, so every hit scores `1.0` and ties are
//! broken by topic name.

use tracing::debug;

use crate::corpus::CorpusStore;
use crate::model::search_result::SearchResult;
use crate::model::trend_record::tag_body;
use crate::temporal::DateWindow;

/// Score given to every lexical match.
pub const LEXICAL_SCORE: f32 = 1.0;

/// Lower-cased, whitespace-split query tokens.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// True when any token occurs in the topic, or in the text after its `#` marker.
pub fn matches_topic(tokens: &[String], topic: &str) -> bool {
    let lowered = topic.to_lowercase();
    tokens.iter().any(|tok| lowered.contains(tok.as_str()))
        || tag_body(&lowered).is_some_and(|body| tokens.iter().any(|tok| body.contains(tok.as_str())))
}

/// Up to `k` in-window topics matching `query`, sorted by score then topic name.
pub fn keyword_search(
    corpus: &CorpusStore,
    query: &str,
    k: usize,
    window: &DateWindow,
) -> Vec<SearchResult> {
    let tokens = tokenize(query);
    if tokens.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut hits: Vec<SearchResult> = corpus
        .topics()
        .filter(|topic| matches_topic(&tokens, topic))
        .filter(|topic| corpus.seen_within(topic, window))
        .map(|topic| SearchResult::new(topic, LEXICAL_SCORE))
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.topic.cmp(&b.topic)));
    hits.truncate(k);

    debug!(hits = hits.len(), tokens = tokens.len(), "keyword search complete");
    hits
}
