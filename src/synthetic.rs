//! Seeded synthetic datasets.
//!
//! Dataset acquisition is outside this crate; these generators give the
//! pipeline, tests and benchmarks a reproducible graph with community
//! structure and node features to work on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::Graph;

/// Planted-partition dataset parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticGraphConfig {
    /// Total node count (default: 2000)
    pub nodes: usize,
    /// Number of planted communities (default: 40)
    pub communities: usize,
    /// Edge probability inside a community (default: 0.12)
    pub p_in: f64,
    /// Edge probability across communities (default: 0.0005)
    pub p_out: f64,
    /// Node feature width; 0 for no features (default: 32)
    pub feature_dim: usize,
    /// RNG seed (default: 7)
    pub seed: u64,
}

impl Default for SyntheticGraphConfig {
    fn default() -> Self {
        Self {
            nodes: 2000,
            communities: 40,
            p_in: 0.12,
            p_out: 0.0005,
            feature_dim: 32,
            seed: 7,
        }
    }
}

/// Erdős–Rényi `G(n, p)` without features.
pub fn random_graph(n: usize, p: f64, seed: u64) -> Result<Graph> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.gen_bool(p.clamp(0.0, 1.0)) {
                edges.push((u, v));
            }
        }
    }
    Graph::new(n, edges)
}

/// Community of `node` when `nodes` are split into `communities`
/// contiguous blocks.
pub fn community_of(node: usize, nodes: usize, communities: usize) -> usize {
    let communities = communities.max(1);
    let block = nodes.div_ceil(communities).max(1);
    (node / block).min(communities - 1)
}

/// Planted-partition graph: dense contiguous communities, sparse links
/// between them, and features that lean towards the node's community.
pub fn planted_partition(config: &SyntheticGraphConfig) -> Result<Graph> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.nodes;
    let communities = config.communities.max(1);
    let p_in = config.p_in.clamp(0.0, 1.0);
    let p_out = config.p_out.clamp(0.0, 1.0);

    let mut edges = Vec::new();
    for u in 0..n {
        let cu = community_of(u, n, communities);
        for v in (u + 1)..n {
            let p = if community_of(v, n, communities) == cu { p_in } else { p_out };
            if rng.gen_bool(p) {
                edges.push((u, v));
            }
        }
    }

    let graph = Graph::new(n, edges)?;
    if config.feature_dim == 0 {
        return Ok(graph);
    }

    let width = config.feature_dim;
    let mut data = Vec::with_capacity(n * width);
    for u in 0..n {
        let c = community_of(u, n, communities);
        for j in 0..width {
            let noise: f32 = rng.gen_range(-0.5..0.5);
            let signal = if j == c % width { 1.0 } else { 0.0 };
            data.push(signal + noise);
        }
    }
    graph.with_feature_matrix(width, data)
}
