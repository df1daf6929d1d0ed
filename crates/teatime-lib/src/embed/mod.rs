/*
Embedding seam.

The engine never computes embeddings on the query path: callers hand it a
vector produced elsewhere. Building a snapshot does need an embedder, so the
`QueryEmbedder` trait marks where a real model or remote embedding service
plugs in. `HashingEmbedder` is the deterministic implementation used for
offline snapshots and tests: the same text always maps to the same vector, so
fixtures stay reproducible without model assets or network access.

Components come from seeded xxh64, whose output is fixed by its published
algorithm, so a snapshot built today matches one built by any later release.
*/

use anyhow::Result;
use xxhash_rust::xxh64::xxh64;

/// Default hashed embedding width; matches common small sentence-embedding models.
pub const DEFAULT_HASH_DIM: usize = 384;

/// Turns text into fixed-width vectors.
pub trait QueryEmbedder: Send + Sync {
    /// Width of every vector this embedder returns.
    fn dim(&self) -> usize;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text.to_string()])?;
        out.pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Deterministic, hash-seeded embedder producing values in [-1.0, 1.0].
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        (0..self.dim)
            .map(|i| {
                let h = xxh64(text.as_bytes(), i as u64);
                // Map u64 -> [0,1] -> [-1,1]
                let v = (h as f64) / (u64::MAX as f64);
                (v * 2.0 - 1.0) as f32
            })
            .collect()
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIM)
    }
}

impl QueryEmbedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}
