//! Embedding snapshot persistence.
//!
//! A snapshot is two files that must stay index-aligned:
//! - `topic_embeddings.npy`: an `n × d` float matrix (`f64` is narrowed to `f32`)
//! - `topic_index.json`: `n` [`TopicMeta`] records, record `i` describing row `i`
//!
//! Building a snapshot publishes every file through a temporary file in the
//! same directory followed by a rename, so readers see either the old file or
//! the complete new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use ndarray::Array2;
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::corpus::CorpusStore;
use crate::dense::EmbeddingIndex;
use crate::embed::QueryEmbedder;

/// Topics embedded per embedder call.
const EMBED_BATCH: usize = 128;

/// Progress callback for long-running operations.
/// Receives a message describing the current step and a progress fraction (0.0..1.0).
pub type ProgressCallback = Arc<dyn Fn(String, f32) + Send + Sync>;

/// Metadata record stored alongside each embedding row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMeta {
    pub topic: String,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub days_seen: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot file {} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("embedding matrix is unreadable: {0}")]
    Npy(#[from] ReadNpyError),

    #[error("topic index is unreadable: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedding matrix has {rows} rows but topic index has {records} records")]
    LengthMismatch { rows: usize, records: usize },
}

fn open(path: &Path) -> Result<BufReader<File>, SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::Missing(path.to_path_buf()));
    }
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read the embedding matrix as `f32`, accepting `f64` files as well.
fn read_matrix(path: &Path) -> Result<Array2<f32>, SnapshotError> {
    match Array2::<f32>::read_npy(open(path)?) {
        Ok(matrix) => Ok(matrix),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            let wide = Array2::<f64>::read_npy(open(path)?)?;
            Ok(wide.mapv(|x| x as f32))
        }
        Err(err) => Err(err.into()),
    }
}

/// Load a snapshot from its matrix and metadata files.
///
/// # Errors
///
/// Any missing, unreadable or misaligned file.
pub fn load_snapshot(embeddings: &Path, index: &Path) -> Result<EmbeddingIndex, SnapshotError> {
    let matrix = read_matrix(embeddings)?;
    let records: Vec<TopicMeta> = serde_json::from_reader(open(index)?)?;
    EmbeddingIndex::new(matrix, records)
}

/// Load the configured snapshot, or `None` when it is missing or unusable.
///
/// A broken snapshot is not fatal: the engine runs lexical-only instead.
pub fn load_optional(cfg: &EngineConfig) -> Option<EmbeddingIndex> {
    let (emb, idx) = (cfg.embeddings_path(), cfg.index_path());
    match load_snapshot(&emb, &idx) {
        Ok(index) => {
            info!(
                entries = index.len(),
                dim = index.dim(),
                path = %emb.display(),
                "loaded embedding snapshot"
            );
            Some(index)
        }
        Err(SnapshotError::Missing(path)) => {
            info!(path = %path.display(), "no embedding snapshot; lexical search only");
            None
        }
        Err(err) => {
            warn!(%err, "ignoring embedding snapshot; lexical search only");
            None
        }
    }
}

/// Write `path` by filling a temp file in the same directory and renaming it over.
fn publish_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        fill(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("publishing {}", path.display()))?;
    Ok(())
}

/// Embed every corpus topic and publish a fresh snapshot under `cfg.data_dir`.
///
/// Files are published summary first and topic index last, so a reader racing
/// the build sees at worst a row/record mismatch, which it treats as "no
/// embeddings".
///
/// # Returns
///
/// The in-memory index that was written.
pub fn build_snapshot(
    corpus: &CorpusStore,
    embedder: &dyn QueryEmbedder,
    cfg: &EngineConfig,
    progress: Option<ProgressCallback>,
) -> Result<EmbeddingIndex> {
    let summaries = corpus.topic_summaries();
    let docs: Vec<String> = summaries.iter().map(|s| s.document()).collect();
    let dim = embedder.dim();
    let total = docs.len();

    let mut flat: Vec<f32> = Vec::with_capacity(total * dim);
    for (batch_no, batch) in docs.chunks(EMBED_BATCH).enumerate() {
        let vectors = embedder
            .embed_batch(batch)
            .with_context(|| format!("embedding batch {}", batch_no))?;
        anyhow::ensure!(
            vectors.len() == batch.len(),
            "embedder returned {} vectors for {} documents",
            vectors.len(),
            batch.len()
        );
        for v in vectors {
            anyhow::ensure!(v.len() == dim, "embedder returned a {}-wide vector, expected {}", v.len(), dim);
            flat.extend(v);
        }
        if let Some(ref cb) = progress {
            let done = (batch_no * EMBED_BATCH + batch.len()).min(total);
            cb(format!("Embedded {}/{}", done, total), done as f32 / total.max(1) as f32);
        }
    }

    let matrix = Array2::from_shape_vec((total, dim), flat).context("shaping embedding matrix")?;
    let records: Vec<TopicMeta> = summaries
        .iter()
        .map(|s| TopicMeta {
            topic: s.topic.clone(),
            first_seen: Some(s.first_seen.clone()),
            last_seen: Some(s.last_seen.clone()),
            days_seen: s.days_seen,
        })
        .collect();

    fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("creating {}", cfg.data_dir.display()))?;

    publish_atomically(&cfg.summary_path(), |w| {
        serde_json::to_writer_pretty(w, &summaries)?;
        Ok(())
    })?;
    publish_atomically(&cfg.embeddings_path(), |w| {
        matrix.write_npy(w)?;
        Ok(())
    })?;
    publish_atomically(&cfg.index_path(), |w| {
        serde_json::to_writer_pretty(w, &records)?;
        Ok(())
    })?;

    info!(
        topics = total,
        dim,
        path = %cfg.data_dir.display(),
        "published embedding snapshot"
    );
    Ok(EmbeddingIndex::new(matrix, records)?)
}
