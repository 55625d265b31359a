//! Coarsening phase: collapse heavy-edge matchings into weighted multinodes.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::Graph;

const UNMATCHED: usize = usize::MAX;

/// Graph with vertex and edge weights, used at every level of the hierarchy.
///
/// The finest level has unit weights; each coarser vertex weighs as much as
/// the fine vertices it absorbed, and each coarse edge as much as the fine
/// edges it replaced.
#[derive(Debug, Clone)]
pub(crate) struct WeightedGraph {
    pub vertex_weights: Vec<usize>,
    /// `(neighbor, edge_weight)`, sorted by neighbor.
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl WeightedGraph {
    pub fn from_graph(graph: &Graph) -> Self {
        let adjacency = (0..graph.node_count())
            .map(|u| graph.neighbors(u).iter().map(|&v| (v, 1)).collect())
            .collect();
        Self {
            vertex_weights: vec![1; graph.node_count()],
            adjacency,
        }
    }

    pub fn node_count(&self) -> usize {
        self.vertex_weights.len()
    }

    pub fn total_weight(&self) -> usize {
        self.vertex_weights.iter().sum()
    }
}

/// One coarsening step: the coarser graph and where each fine vertex went.
#[derive(Debug)]
pub(crate) struct CoarseLevel {
    pub graph: WeightedGraph,
    pub fine_to_coarse: Vec<usize>,
}

/// Heavy-edge matching.
///
/// Vertices are visited in random order; each unmatched vertex pairs with the
/// unmatched neighbor across its heaviest edge, as long as the merged weight
/// stays within `max_vertex_weight`. Returns `None` when nothing could be
/// matched (the graph cannot get any coarser).
pub(crate) fn coarsen<R: Rng>(
    graph: &WeightedGraph,
    max_vertex_weight: usize,
    rng: &mut R,
) -> Option<CoarseLevel> {
    let n = graph.node_count();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut mate = vec![UNMATCHED; n];
    let mut matched_pairs = 0;
    for &u in &order {
        if mate[u] != UNMATCHED {
            continue;
        }
        let mut best: Option<(usize, usize)> = None;
        for &(v, weight) in &graph.adjacency[u] {
            if mate[v] != UNMATCHED
                || graph.vertex_weights[u] + graph.vertex_weights[v] > max_vertex_weight
            {
                continue;
            }
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((v, weight));
            }
        }
        match best {
            Some((v, _)) => {
                mate[u] = v;
                mate[v] = u;
                matched_pairs += 1;
            }
            None => mate[u] = u,
        }
    }

    if matched_pairs == 0 {
        return None;
    }

    let mut fine_to_coarse = vec![UNMATCHED; n];
    let mut coarse_count = 0;
    for u in 0..n {
        if fine_to_coarse[u] != UNMATCHED {
            continue;
        }
        fine_to_coarse[u] = coarse_count;
        fine_to_coarse[mate[u]] = coarse_count;
        coarse_count += 1;
    }

    let mut vertex_weights = vec![0; coarse_count];
    let mut merged: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new(); coarse_count];
    for u in 0..n {
        let cu = fine_to_coarse[u];
        vertex_weights[cu] += graph.vertex_weights[u];
        for &(v, weight) in &graph.adjacency[u] {
            let cv = fine_to_coarse[v];
            if cu != cv {
                *merged[cu].entry(cv).or_default() += weight;
            }
        }
    }

    let adjacency = merged
        .into_iter()
        .map(|edges| edges.into_iter().collect())
        .collect();

    Some(CoarseLevel {
        graph: WeightedGraph {
            vertex_weights,
            adjacency,
        },
        fine_to_coarse,
    })
}
