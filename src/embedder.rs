//! Graph embedders.
//!
//! The pipeline only depends on [`QueryEmbedder`]: `embed(graph) -> vector`
//! with a fixed output dimension. How the vector is produced belongs to the
//! embedder. Two implementations ship with the crate:
//!
//! - [`GinEmbedder`]: a frozen one-layer GIN-style encoder (sum aggregation,
//!   ReLU MLP, mean pooling, linear head, L2 normalization) whose weights come
//!   from a [`ModelState`] file or a seed. Training is out of scope; the
//!   weights are treated as an opaque persisted handle.
//! - [`MeanPoolEmbedder`]: mean of node features, for tests and baselines.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::Graph;

pub type EmbeddingVector = Vec<f32>;

/// Maps a graph to a fixed-length vector.
///
/// Implementations must be deterministic for a frozen state and must not
/// mutate the graph. `Send + Sync` so partitions can be embedded in parallel.
pub trait QueryEmbedder: Send + Sync {
    /// Length of every vector returned by [`embed`](Self::embed).
    fn dimension(&self) -> usize;

    fn embed(&self, graph: &Graph) -> Result<EmbeddingVector>;
}

impl<E: QueryEmbedder + ?Sized> QueryEmbedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, graph: &Graph) -> Result<EmbeddingVector> {
        (**self).embed(graph)
    }
}

// ── Model state ─────────────────────────────────────────────────────

/// Frozen encoder weights. Matrices are row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
    /// `hidden_dim x input_dim`
    pub conv_weights: Vec<f32>,
    pub conv_bias: Vec<f32>,
    /// `output_dim x hidden_dim`
    pub head_weights: Vec<f32>,
    pub head_bias: Vec<f32>,
}

impl ModelState {
    /// Uniform Glorot-style initialization from `seed`.
    pub fn seeded(input_dim: usize, hidden_dim: usize, output_dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut glorot = |rows: usize, cols: usize| -> Vec<f32> {
            let limit = (6.0 / (rows + cols).max(1) as f32).sqrt();
            (0..rows * cols).map(|_| rng.gen_range(-limit..=limit)).collect()
        };
        let conv_weights = glorot(hidden_dim, input_dim);
        let head_weights = glorot(output_dim, hidden_dim);
        Self {
            input_dim,
            hidden_dim,
            output_dim,
            conv_weights,
            conv_bias: vec![0.0; hidden_dim],
            head_weights,
            head_bias: vec![0.0; output_dim],
        }
    }

    /// Load weights from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let state: ModelState = serde_json::from_slice(&bytes)?;
        state.validate()?;
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// blake3 digest of the serialized weights, hex encoded.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }

    fn validate(&self) -> Result<()> {
        let shapes = [
            ("conv_weights", self.conv_weights.len(), self.hidden_dim * self.input_dim),
            ("conv_bias", self.conv_bias.len(), self.hidden_dim),
            ("head_weights", self.head_weights.len(), self.output_dim * self.hidden_dim),
            ("head_bias", self.head_bias.len(), self.output_dim),
        ];
        for (name, found, expected) in shapes {
            if found != expected {
                return Err(GraphError::EmbedderFailure(format!(
                    "model state {} has {} values, expected {}",
                    name, found, expected
                )));
            }
        }
        Ok(())
    }
}

/// `out = W x + b` for a row-major `rows x cols` matrix.
fn affine(weights: &[f32], bias: &[f32], x: &[f32], out: &mut [f32]) {
    let cols = x.len();
    for (row, slot) in out.iter_mut().enumerate() {
        let w = &weights[row * cols..(row + 1) * cols];
        *slot = bias[row] + w.iter().zip(x).map(|(a, b)| a * b).sum::<f32>();
    }
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn check_finite(v: EmbeddingVector, what: &str) -> Result<EmbeddingVector> {
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        tracing::warn!(component = pos, "{} produced a non-finite embedding", what);
        return Err(GraphError::EmbedderFailure(format!(
            "{} produced a non-finite value at component {}",
            what, pos
        )));
    }
    Ok(v)
}

// ── GIN encoder ─────────────────────────────────────────────────────

/// Frozen GIN-style graph encoder.
#[derive(Debug, Clone)]
pub struct GinEmbedder {
    state: ModelState,
}

impl GinEmbedder {
    pub fn new(state: ModelState) -> Result<Self> {
        state.validate()?;
        Ok(Self { state })
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }
}

impl QueryEmbedder for GinEmbedder {
    fn dimension(&self) -> usize {
        self.state.output_dim
    }

    fn embed(&self, graph: &Graph) -> Result<EmbeddingVector> {
        let s = &self.state;
        if graph.feature_dim() != s.input_dim {
            return Err(GraphError::dimension(
                s.input_dim,
                graph.feature_dim(),
                "node features vs model input",
            ));
        }
        if graph.is_empty() {
            return Ok(vec![0.0; s.output_dim]);
        }

        let mut pooled = vec![0.0f32; s.hidden_dim];
        let mut aggregate = vec![0.0f32; s.input_dim];
        let mut hidden = vec![0.0f32; s.hidden_dim];
        for node in 0..graph.node_count() {
            // features are present: feature_dim == input_dim and graph is non-empty
            let own = graph.features(node).unwrap_or(&[]);
            aggregate.copy_from_slice(own);
            for &nbr in graph.neighbors(node) {
                for (acc, x) in aggregate.iter_mut().zip(graph.features(nbr).unwrap_or(&[])) {
                    *acc += x;
                }
            }
            affine(&s.conv_weights, &s.conv_bias, &aggregate, &mut hidden);
            for (p, h) in pooled.iter_mut().zip(&hidden) {
                *p += h.max(0.0);
            }
        }
        let count = graph.node_count() as f32;
        for p in pooled.iter_mut() {
            *p /= count;
        }

        let mut out = vec![0.0f32; s.output_dim];
        affine(&s.head_weights, &s.head_bias, &pooled, &mut out);
        l2_normalize(&mut out);
        check_finite(out, "GIN encoder")
    }
}

// ── Mean pooling ────────────────────────────────────────────────────

/// Mean of node feature rows, optionally L2-normalized.
#[derive(Debug, Clone)]
pub struct MeanPoolEmbedder {
    dimension: usize,
    normalize: bool,
}

impl MeanPoolEmbedder {
    pub fn new(dimension: usize, normalize: bool) -> Self {
        Self {
            dimension,
            normalize,
        }
    }
}

impl QueryEmbedder for MeanPoolEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, graph: &Graph) -> Result<EmbeddingVector> {
        if graph.feature_dim() != self.dimension {
            return Err(GraphError::dimension(
                self.dimension,
                graph.feature_dim(),
                "node features vs mean-pool width",
            ));
        }
        let mut out = vec![0.0f32; self.dimension];
        if graph.is_empty() {
            return Ok(out);
        }
        for node in 0..graph.node_count() {
            for (acc, x) in out.iter_mut().zip(graph.features(node).unwrap_or(&[])) {
                *acc += x;
            }
        }
        let count = graph.node_count() as f32;
        for x in out.iter_mut() {
            *x /= count;
        }
        if self.normalize {
            l2_normalize(&mut out);
        }
        check_finite(out, "mean pooling")
    }
}
