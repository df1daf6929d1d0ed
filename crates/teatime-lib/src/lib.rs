//! Library entry point for the teatime trend retrieval engine.
//!
//! This file re-exports the core types and provides convenient helpers to
//! load an engine from a data directory or config file, and to rebuild the
//! embedding snapshot for a corpus.
//
// Public modules
pub mod config;
pub mod corpus;
pub mod dense;
pub mod embed;
pub mod engine;
pub mod lexical;
pub mod model;
pub mod snapshot;
pub mod temporal;
pub mod utils;

// Re-export primary types for ergonomic use.
pub use config::{ConfigError, EngineConfig};
pub use corpus::{CorpusBounds, CorpusError, CorpusStore};
pub use dense::{DenseRanker, EmbeddingIndex};
pub use embed::{HashingEmbedder, QueryEmbedder};
pub use engine::{CorpusSummary, Retrieval, RetrievalEngine, RetrievalMode};
pub use model::{
    search_result::SearchResult,
    timeline::{Ingredient, TopicSummary, TopicTimeline},
    trend_record::{RawTrendRow, TrendRecord},
};
pub use snapshot::{ProgressCallback, SnapshotError, TopicMeta};
pub use temporal::DateWindow;

use anyhow::{Context, Result};
use std::path::Path;

/// Resolve the engine configuration from an optional TOML file and an optional
/// data directory override.
///
/// # Arguments
///
/// * `config_file` - TOML file to read; defaults are used when `None`
/// * `data_dir` - overrides `data_dir` from the file (or the default)
///
/// # Returns
///
/// The merged `EngineConfig`, or an error if the file cannot be read or parsed.
pub fn resolve_config(config_file: Option<&Path>, data_dir: Option<&Path>) -> Result<EngineConfig> {
    let mut cfg = match config_file {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = data_dir {
        cfg.data_dir = dir.to_path_buf();
    }
    Ok(cfg)
}

/// Load a ready-to-query engine for `cfg`.
///
/// # Behavior
///
/// - Fails only when the corpus is missing, unreadable or has no usable rows.
/// - A missing or inconsistent embedding snapshot is logged and the engine
///   serves lexical results only.
pub fn load_engine(cfg: &EngineConfig) -> Result<RetrievalEngine> {
    RetrievalEngine::load(cfg)
        .with_context(|| format!("loading corpus {}", cfg.corpus_path().display()))
}

/// Rebuild the embedding snapshot for the corpus named by `cfg`.
///
/// # Arguments
///
/// * `cfg` - locates the corpus and the snapshot output files
/// * `embedder` - turns each topic summary document into a vector
/// * `progress` - optional callback receiving `(message, fraction)` updates
///
/// # Returns
///
/// The freshly written `EmbeddingIndex`.
pub fn rebuild_snapshot(
    cfg: &EngineConfig,
    embedder: &dyn QueryEmbedder,
    progress: Option<ProgressCallback>,
) -> Result<EmbeddingIndex> {
    utils::logging::init();
    let corpus = CorpusStore::from_csv_path(&cfg.corpus_path())
        .with_context(|| format!("loading corpus {}", cfg.corpus_path().display()))?;
    snapshot::build_snapshot(&corpus, embedder, cfg, progress)
}
