//! Engine configuration: data file locations and ranking knobs.
//!
//! Every field has a default, so an empty TOML file (or none at all) gives the
//! reference behaviour.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default size of the dense-ranking prefix taken before window filtering.
pub const DEFAULT_OVERSAMPLE: usize = 64;
/// Added to each L2 norm before dividing, so zero vectors score 0 instead of NaN.
pub const DEFAULT_NORM_EPSILON: f32 = 1e-8;
pub const DEFAULT_K: usize = 10;
pub const MAX_K: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the corpus table and the embedding snapshot.
    pub data_dir: PathBuf,
    pub corpus_file: String,
    pub embeddings_file: String,
    pub index_file: String,
    pub summary_file: String,
    /// How many globally best dense candidates survive to the window filter.
    pub oversample: usize,
    pub norm_epsilon: f32,
    /// `k` used by callers that do not pass one.
    pub default_k: usize,
    /// Upper bound callers clamp `k` to.
    pub max_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            data_dir: PathBuf::from("data"),
            corpus_file: "trends_min_us.csv".to_string(),
            embeddings_file: "topic_embeddings.npy".to_string(),
            index_file: "topic_index.json".to_string(),
            summary_file: "trends_topic_summary.json".to_string(),
            oversample: DEFAULT_OVERSAMPLE,
            norm_epsilon: DEFAULT_NORM_EPSILON,
            default_k: DEFAULT_K,
            max_k: MAX_K,
        }
    }
}

impl EngineConfig {
    /// Defaults with a different data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join(&self.corpus_file)
    }

    pub fn embeddings_path(&self) -> PathBuf {
        self.data_dir.join(&self.embeddings_file)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.index_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.data_dir.join(&self.summary_file)
    }

    /// Caller guardrail: `k` defaults to `default_k` and is clamped to `1..=max_k`.
    pub fn clamp_k(&self, k: Option<usize>) -> usize {
        k.unwrap_or(self.default_k).clamp(1, self.max_k.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.oversample, 64);
        assert_eq!(cfg.corpus_path(), PathBuf::from("data/trends_min_us.csv"));
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let cfg = EngineConfig::from_toml_str("data_dir = \"/srv/trends\"\noversample = 16\n").unwrap();
        assert_eq!(cfg.oversample, 16);
        assert_eq!(cfg.index_path(), PathBuf::from("/srv/trends/topic_index.json"));
        assert_eq!(cfg.max_k, MAX_K);
    }

    #[test]
    fn unknown_type_is_parse_error() {
        let err = EngineConfig::from_toml_str("oversample = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn clamp_k_guardrail() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.clamp_k(None), 10);
        assert_eq!(cfg.clamp_k(Some(0)), 1);
        assert_eq!(cfg.clamp_k(Some(500)), 50);
        assert_eq!(cfg.clamp_k(Some(7)), 7);
    }
}
