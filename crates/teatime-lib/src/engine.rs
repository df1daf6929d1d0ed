//! RetrievalEngine: one corpus, one optional embedding index, read-only after load.
//!
//! Query flow: clamp window -> dense ranking (if a query vector is given and
//! embeddings exist) -> lexical fallback when dense yields nothing -> timeline
//! enrichment. Nothing on the query path mutates state, so a single engine can
//! be shared behind an `Arc` by any number of concurrent callers.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::corpus::{CorpusBounds, CorpusError, CorpusStore};
use crate::dense::{DenseRanker, EmbeddingIndex};
use crate::lexical;
use crate::model::search_result::SearchResult;
use crate::model::timeline::{Ingredient, TopicTimeline};
use crate::snapshot;
use crate::temporal::{self, DateWindow};
use crate::utils::logging;

/// Which tier produced a retrieval's results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Dense,
    Lexical,
}

/// Output of [`RetrievalEngine::retrieve`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Retrieval {
    /// The effective (clamped) window the results were filtered by.
    pub window: DateWindow,
    pub mode: RetrievalMode,
    pub ingredients: Vec<Ingredient>,
}

/// Corpus statistics for health checks and diagnostics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub topics: usize,
    pub records: usize,
    pub rows_skipped: usize,
    pub has_embeddings: bool,
    pub embedding_count: usize,
    pub bounds: CorpusBounds,
}

#[derive(Debug)]
pub struct RetrievalEngine {
    corpus: CorpusStore,
    index: Option<EmbeddingIndex>,
    ranker: DenseRanker,
}

impl RetrievalEngine {
    pub fn new(corpus: CorpusStore, index: Option<EmbeddingIndex>, config: &EngineConfig) -> Self {
        Self {
            corpus,
            index,
            ranker: DenseRanker::from_config(config),
        }
    }

    /// Load the corpus and (optionally) the embedding snapshot named by `config`.
    ///
    /// # Errors
    ///
    /// Only corpus failures are fatal. A missing or broken snapshot leaves the
    /// engine in lexical-only mode.
    pub fn load(config: &EngineConfig) -> Result<Self, CorpusError> {
        logging::init();
        let corpus = CorpusStore::from_csv_path(&config.corpus_path())?;
        let index = snapshot::load_optional(config);
        info!(
            topics = corpus.topic_count(),
            embeddings = index.as_ref().map(EmbeddingIndex::len).unwrap_or(0),
            "retrieval engine ready"
        );
        Ok(Self::new(corpus, index, config))
    }

    pub fn corpus(&self) -> &CorpusStore {
        &self.corpus
    }

    pub fn bounds(&self) -> &CorpusBounds {
        self.corpus.bounds()
    }

    /// True when an index with at least one entry is loaded.
    pub fn has_embeddings(&self) -> bool {
        self.index.as_ref().is_some_and(|i| !i.is_empty())
    }

    pub fn embedding_dim(&self) -> Option<usize> {
        self.index.as_ref().map(EmbeddingIndex::dim)
    }

    pub fn clamp_window(&self, start: Option<&str>, end: Option<&str>) -> DateWindow {
        temporal::clamp(start, end, self.corpus.bounds())
    }

    /// Dense search within the clamped window. Empty when no embeddings are loaded.
    pub fn dense_search(
        &self,
        query: &[f32],
        k: usize,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Vec<SearchResult> {
        let window = self.clamp_window(start, end);
        self.dense_in(query, k, &window)
    }

    /// Keyword search within the clamped window.
    pub fn keyword_search(
        &self,
        query: &str,
        k: usize,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Vec<SearchResult> {
        let window = self.clamp_window(start, end);
        lexical::keyword_search(&self.corpus, query, k, &window)
    }

    pub fn topic_timeline(&self, topic: &str) -> TopicTimeline {
        self.corpus.timeline(topic)
    }

    /// Dense-first retrieval with lexical fallback, enriched with timelines.
    ///
    /// Never fails: an empty `ingredients` list is a valid answer.
    pub fn retrieve(
        &self,
        query_vector: Option<&[f32]>,
        query_text: &str,
        k: usize,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Retrieval {
        let window = self.clamp_window(start, end);

        let dense = query_vector
            .map(|v| self.dense_in(v, k, &window))
            .unwrap_or_default();
        let (mode, hits) = if dense.is_empty() {
            (
                RetrievalMode::Lexical,
                lexical::keyword_search(&self.corpus, query_text, k, &window),
            )
        } else {
            (RetrievalMode::Dense, dense)
        };

        let ingredients: Vec<Ingredient> = hits
            .iter()
            .map(|hit| Ingredient::from_parts(hit, &self.topic_timeline(&hit.topic)))
            .collect();

        debug!(
            ?mode,
            hits = ingredients.len(),
            start = %window.start,
            end = %window.end,
            "retrieval complete"
        );

        Retrieval {
            window,
            mode,
            ingredients,
        }
    }

    pub fn summary(&self) -> CorpusSummary {
        CorpusSummary {
            topics: self.corpus.topic_count(),
            records: self.corpus.record_count(),
            rows_skipped: self.corpus.rows_skipped(),
            has_embeddings: self.has_embeddings(),
            embedding_count: self.index.as_ref().map(EmbeddingIndex::len).unwrap_or(0),
            bounds: self.corpus.bounds().clone(),
        }
    }

    fn dense_in(&self, query: &[f32], k: usize, window: &DateWindow) -> Vec<SearchResult> {
        match &self.index {
            Some(index) => self.ranker.search(index, &self.corpus, query, k, window),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trend_record::RawTrendRow;
    use crate::snapshot::TopicMeta;
    use ndarray::array;

    fn corpus() -> CorpusStore {
        CorpusStore::from_rows(vec![
            RawTrendRow::new("2024-04-08", "1", "Eclipse"),
            RawTrendRow::new("2024-04-09", "1", "Eclipse"),
            RawTrendRow::new("2024-01-01", "1", "Budget"),
        ])
        .unwrap()
    }

    fn meta(topic: &str) -> TopicMeta {
        TopicMeta {
            topic: topic.into(),
            first_seen: None,
            last_seen: None,
            days_seen: 0,
        }
    }

    fn with_index() -> RetrievalEngine {
        let index = EmbeddingIndex::new(
            array![[1.0_f32, 0.0], [0.0, 1.0]],
            vec![meta("Eclipse"), meta("Budget")],
        )
        .unwrap();
        RetrievalEngine::new(corpus(), Some(index), &EngineConfig::default())
    }

    #[test]
    fn dense_hit_wins_over_lexical() {
        let engine = with_index();
        let r = engine.retrieve(Some(&[0.0, 1.0]), "eclipse", 5, None, None);
        assert_eq!(r.mode, RetrievalMode::Dense);
        assert_eq!(r.ingredients[0].topic, "Budget");
        assert_eq!(r.ingredients[0].days_seen, 1);
    }

    #[test]
    fn empty_dense_falls_back_to_lexical() {
        let engine = with_index();
        // Budget ranks first but is filtered out; Eclipse is still a dense hit.
        let r = engine.retrieve(Some(&[0.0, 1.0]), "eclipse", 5, Some("2024-04-01"), None);
        assert_eq!(r.mode, RetrievalMode::Dense);
        assert_eq!(r.ingredients[0].topic, "Eclipse");

        // Wrong width: dense yields nothing.
        let r = engine.retrieve(Some(&[1.0, 0.0, 0.0]), "eclipse", 5, None, None);
        assert_eq!(r.mode, RetrievalMode::Lexical);
        assert_eq!(r.ingredients.len(), 1);
        assert_eq!(r.ingredients[0].score, 1.0);
    }

    #[test]
    fn no_vector_means_lexical() {
        let engine = with_index();
        let r = engine.retrieve(None, "budget", 5, None, None);
        assert_eq!(r.mode, RetrievalMode::Lexical);
        assert_eq!(r.ingredients[0].topic, "Budget");
        assert_eq!(r.window, DateWindow::new("2024-01-01", "2024-04-09"));
    }

    #[test]
    fn summary_reports_index_state() {
        let engine = RetrievalEngine::new(corpus(), None, &EngineConfig::default());
        let s = engine.summary();
        assert_eq!(s.topics, 2);
        assert_eq!(s.records, 3);
        assert!(!s.has_embeddings);
        assert_eq!(engine.embedding_dim(), None);
        assert_eq!(with_index().summary().embedding_count, 2);
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RetrievalEngine>();
    }
}
