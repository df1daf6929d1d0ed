//! Dense ranking over the precomputed topic embedding index.
//!
//! The ranker scores every index row against the query, keeps a fixed-size
//! prefix of the global best (`oversample`), and only then applies the date
//! window and the `k` cut. A topic that would pass the window but falls outside
//! the prefix is not returned; that approximation is intentional.

use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::corpus::CorpusStore;
use crate::model::search_result::SearchResult;
use crate::snapshot::{SnapshotError, TopicMeta};
use crate::temporal::DateWindow;

pub mod similarity;

/// Topic embeddings: matrix row `i` belongs to `records[i]`.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    matrix: Array2<f32>,
    norms: Array1<f32>,
    records: Vec<TopicMeta>,
}

impl EmbeddingIndex {
    /// Pair a matrix with its metadata list.
    ///
    /// # Errors
    ///
    /// `SnapshotError::LengthMismatch` when row and record counts differ.
    pub fn new(matrix: Array2<f32>, records: Vec<TopicMeta>) -> Result<Self, SnapshotError> {
        if matrix.nrows() != records.len() {
            return Err(SnapshotError::LengthMismatch {
                rows: matrix.nrows(),
                records: records.len(),
            });
        }
        let norms = similarity::row_norms(&matrix);
        Ok(Self {
            matrix,
            norms,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding width (0 for an empty index).
    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn records(&self) -> &[TopicMeta] {
        &self.records
    }

    pub fn matrix(&self) -> &Array2<f32> {
        &self.matrix
    }
}

/// Oversample-then-filter cosine ranker.
#[derive(Debug, Clone, Copy)]
pub struct DenseRanker {
    pub oversample: usize,
    pub norm_epsilon: f32,
}

impl DenseRanker {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            oversample: cfg.oversample,
            norm_epsilon: cfg.norm_epsilon,
        }
    }

    /// Rank `index` against `query` and return at most `k` in-window topics.
    ///
    /// An empty index, a zero `k`, or a query whose width does not match the
    /// index all yield an empty result.
    pub fn search(
        &self,
        index: &EmbeddingIndex,
        corpus: &CorpusStore,
        query: &[f32],
        k: usize,
        window: &DateWindow,
    ) -> Vec<SearchResult> {
        if index.is_empty() || k == 0 {
            return Vec::new();
        }
        if query.len() != index.dim() {
            warn!(
                query_dim = query.len(),
                index_dim = index.dim(),
                "query embedding width does not match index; skipping dense search"
            );
            return Vec::new();
        }

        let scores = similarity::cosine_scores(
            &index.matrix,
            &index.norms,
            ArrayView1::from(query),
            self.norm_epsilon,
        );
        let ranked = similarity::rank_descending(&scores);

        let results: Vec<SearchResult> = ranked
            .into_iter()
            .take(self.oversample)
            .map(|(i, score)| SearchResult::new(index.records[i].topic.clone(), score))
            .filter(|hit| corpus.seen_within(&hit.topic, window))
            .take(k)
            .collect();

        debug!(
            hits = results.len(),
            k,
            oversample = self.oversample,
            "dense search complete"
        );
        results
    }
}
