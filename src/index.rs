//! Exact k-nearest-neighbor index over partition embeddings.
//!
//! One vector per partition, searched by linear scan. Partition counts are
//! tens to low hundreds, so the scan is cheap and the result is exact: no
//! retrieval noise can hide a verifier problem.
//!
//! `build` takes `&mut self` and `search` takes `&self`, so the borrow
//! checker enforces that a build completes before any search and that no
//! search overlaps a rebuild. A built index is `Sync` and can be searched
//! from many threads.

use serde::{Deserialize, Serialize};

use crate::embedder::EmbeddingVector;
use crate::error::{GraphError, Result};

/// How distances between embeddings are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `sum((a_i - b_i)^2)`
    #[default]
    SquaredEuclidean,
    /// `1 - cos(a, b)`; zero vectors are at distance 1 from everything.
    Cosine,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::SquaredEuclidean => {
                a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
            }
            DistanceMetric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (na * nb)
                }
            }
        }
    }
}

/// A stored `(partition_id, vector)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub partition_id: usize,
    pub vector: EmbeddingVector,
}

impl IndexEntry {
    pub fn new(partition_id: usize, vector: EmbeddingVector) -> Self {
        Self {
            partition_id,
            vector,
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub partition_id: usize,
    pub distance: f32,
}

/// Flat embedding index with a fixed dimension.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    dimension: usize,
    metric: DistanceMetric,
    entries: Vec<IndexEntry>,
    built: bool,
}

impl EmbeddingIndex {
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            entries: Vec::new(),
            built: false,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Replace the index contents.
    ///
    /// Every vector must have the configured dimension; on the first that
    /// does not, fails with `DimensionMismatch` and leaves the previous
    /// contents untouched.
    pub fn build(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        for (position, entry) in entries.iter().enumerate() {
            if entry.vector.len() != self.dimension {
                return Err(GraphError::dimension(
                    self.dimension,
                    entry.vector.len(),
                    format!(
                        "index entry {} (partition {})",
                        position, entry.partition_id
                    ),
                ));
            }
        }
        self.entries = entries;
        self.built = true;
        tracing::info!(entries = self.entries.len(), dimension = self.dimension, "built embedding index");
        Ok(())
    }

    /// The `k` entries nearest to `query`, nearest first.
    ///
    /// Ties keep insertion order. `k` larger than the index returns every
    /// entry. Fails with `IndexNotBuilt` before the first `build` and with
    /// `DimensionMismatch` for a query of the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Candidate>> {
        if !self.built {
            return Err(GraphError::IndexNotBuilt);
        }
        if query.len() != self.dimension {
            return Err(GraphError::dimension(self.dimension, query.len(), "search query"));
        }

        let mut hits: Vec<Candidate> = self
            .entries
            .iter()
            .map(|entry| Candidate {
                partition_id: entry.partition_id,
                distance: self.metric.distance(query, &entry.vector),
            })
            .collect();
        // stable sort keeps insertion order among equal distances
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}
