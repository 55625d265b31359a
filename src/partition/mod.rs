//! Multilevel k-way graph partitioning.
//!
//! Splits one dataset graph into `k` disjoint, near-balanced node subsets
//! with a small edge cut, then induces each subset into a [`Partition`].
//!
//! The heuristic runs in three phases:
//! 1. **Coarsen**: repeated heavy-edge matching until the graph is small
//!    relative to `k` (or stops shrinking).
//! 2. **Initial split**: greedy region growing on the coarsest graph.
//! 3. **Uncoarsen + refine**: project the assignment back level by level,
//!    running bounded greedy boundary refinement at each level.
//!
//! A final rebalance pass on the original graph forces every part into the
//! balance bounds. Imbalance is never an error: the partitioner always
//! returns the best assignment it reached.
//!
//! Determinism: a fixed `seed` yields the same assignment. Partition
//! induction runs on the rayon pool and does not affect the result.

mod coarsen;
mod initial;
mod refine;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::{Graph, Partition};

use coarsen::WeightedGraph;

/// Partitioner tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Allowed relative deviation of a part's size from `|V| / k` (default: 0.03)
    pub imbalance_tolerance: f64,
    /// Maximum refinement passes per level (default: 10)
    pub refine_passes: usize,
    /// Seed for matching order and region seeds (default: 42)
    pub seed: u64,
    /// Coarsening stops once the graph has at most `k * coarsen_to_per_part`
    /// vertices (default: 15)
    pub coarsen_to_per_part: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            imbalance_tolerance: 0.03,
            refine_passes: 10,
            seed: 42,
            coarsen_to_per_part: 15,
        }
    }
}

/// Inclusive node-count bounds every part must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceBounds {
    pub lower: usize,
    pub upper: usize,
}

impl BalanceBounds {
    /// Bounds for `n` nodes in `k` parts with relative tolerance `tolerance`.
    ///
    /// Always admits `floor(n/k)..=ceil(n/k)`, so a unit-weight graph can
    /// satisfy them regardless of how tight the tolerance is.
    pub fn new(n: usize, k: usize, tolerance: f64) -> Self {
        let k = k.max(1);
        let ideal = n as f64 / k as f64;
        let floor = n / k;
        let ceil = n.div_ceil(k);
        let lower = ((ideal * (1.0 - tolerance)).ceil() as usize).min(floor);
        let upper = ((ideal * (1.0 + tolerance)).floor() as usize).max(ceil);
        Self { lower, upper }
    }

    pub fn contains(&self, size: usize) -> bool {
        (self.lower..=self.upper).contains(&size)
    }
}

/// Summary of one partitioning run.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub sizes: Vec<usize>,
    pub edge_cut: usize,
    pub bounds: BalanceBounds,
    /// Largest part size divided by `|V| / k`; 1.0 is perfect balance.
    pub imbalance: f64,
    pub coarsening_levels: usize,
}

impl PartitionStats {
    fn from_assignment(
        graph: &Graph,
        assignment: &[usize],
        k: usize,
        bounds: BalanceBounds,
        coarsening_levels: usize,
    ) -> Self {
        let sizes = part_sizes(assignment, k);
        let ideal = graph.node_count() as f64 / k as f64;
        let largest = sizes.iter().copied().max().unwrap_or(0);
        Self {
            edge_cut: graph.edge_cut(assignment),
            imbalance: if ideal > 0.0 { largest as f64 / ideal } else { 0.0 },
            sizes,
            bounds,
            coarsening_levels,
        }
    }
}

fn part_sizes(assignment: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0; k];
    for &p in assignment {
        sizes[p] += 1;
    }
    sizes
}

/// Multilevel k-way partitioner.
#[derive(Debug, Clone, Default)]
pub struct GraphPartitioner {
    config: PartitionConfig,
}

impl GraphPartitioner {
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Split `graph` into exactly `k` induced partitions, indexed `0..k`.
    ///
    /// Fails with `InvalidPartitionCount` when `k == 0` or `k` exceeds the
    /// node count. The input graph is not modified.
    pub fn partition(&self, graph: &Graph, k: usize) -> Result<Vec<Partition>> {
        let (assignment, _) = self.assign(graph, k)?;
        build_partitions(graph, &assignment, k)
    }

    /// Like [`partition`](Self::partition), also returning run statistics.
    pub fn partition_with_stats(
        &self,
        graph: &Graph,
        k: usize,
    ) -> Result<(Vec<Partition>, PartitionStats)> {
        let (assignment, stats) = self.assign(graph, k)?;
        let partitions = build_partitions(graph, &assignment, k)?;
        Ok((partitions, stats))
    }

    /// Compute the part of every node without building partitions.
    pub fn assign(&self, graph: &Graph, k: usize) -> Result<(Vec<usize>, PartitionStats)> {
        let n = graph.node_count();
        if k == 0 || k > n {
            return Err(GraphError::InvalidPartitionCount { k, nodes: n });
        }

        let bounds = BalanceBounds::new(n, k, self.config.imbalance_tolerance);
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        // ── Phase 1: Coarsen ────────────────────────────────────────────
        let finest = WeightedGraph::from_graph(graph);
        let target = k.saturating_mul(self.config.coarsen_to_per_part).max(k);
        let max_vertex_weight = ((1.5 * n as f64) / target as f64).ceil().max(1.0) as usize;

        let mut levels: Vec<WeightedGraph> = vec![finest];
        let mut projections: Vec<Vec<usize>> = Vec::new();
        while let Some(current) = levels.last() {
            let current_n = current.node_count();
            if current_n <= target {
                break;
            }
            let Some(level) = coarsen::coarsen(current, max_vertex_weight, &mut rng) else {
                break;
            };
            let coarse_n = level.graph.node_count();
            tracing::debug!(
                level = levels.len(),
                from = current_n,
                to = coarse_n,
                "coarsened"
            );
            // matching barely shrinks the graph any more
            let stalled = coarse_n * 20 > current_n * 19;
            projections.push(level.fine_to_coarse);
            levels.push(level.graph);
            if stalled {
                break;
            }
        }

        // ── Phase 2: Initial split ──────────────────────────────────────
        let mut assignment = match levels.last() {
            Some(coarsest) => initial::grow_regions(coarsest, k, &mut rng),
            None => vec![0; n],
        };

        // ── Phase 3: Uncoarsen + refine ─────────────────────────────────
        for depth in (0..levels.len()).rev() {
            if depth + 1 < levels.len() {
                let map = &projections[depth];
                assignment = map.iter().map(|&coarse| assignment[coarse]).collect();
            }
            let level = &levels[depth];
            let mut part_weights = vec![0usize; k];
            for (v, &p) in assignment.iter().enumerate() {
                part_weights[p] += level.vertex_weights[v];
            }
            let moves = refine::refine(
                level,
                &mut assignment,
                &mut part_weights,
                bounds,
                self.config.refine_passes,
            );
            tracing::debug!(level = depth, vertices = level.node_count(), moves, "refined");
        }

        let mut part_weights = part_sizes(&assignment, k);
        if !part_weights.iter().all(|&w| bounds.contains(w)) {
            tracing::warn!(
                min = part_weights.iter().min().copied().unwrap_or(0),
                max = part_weights.iter().max().copied().unwrap_or(0),
                lower = bounds.lower,
                upper = bounds.upper,
                "refinement left parts outside balance bounds; rebalancing"
            );
            let moved = refine::rebalance(&levels[0], &mut assignment, &mut part_weights, bounds);
            tracing::debug!(moved, "rebalanced");
        }

        let stats = PartitionStats::from_assignment(graph, &assignment, k, bounds, levels.len() - 1);
        tracing::info!(
            nodes = n,
            parts = k,
            edge_cut = stats.edge_cut,
            imbalance = stats.imbalance,
            "partitioned graph"
        );
        Ok((assignment, stats))
    }
}

/// Induce one partition per part, in parallel.
fn build_partitions(graph: &Graph, assignment: &[usize], k: usize) -> Result<Vec<Partition>> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (node, &part) in assignment.iter().enumerate() {
        members[part].push(node);
    }

    members
        .into_par_iter()
        .enumerate()
        .map(|(id, nodes)| {
            let sub = graph.induced_subgraph(&nodes)?;
            Ok(Partition::new(id, sub, nodes))
        })
        .collect()
}
