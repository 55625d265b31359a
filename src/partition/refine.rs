//! Refinement phase: greedy boundary moves and the final balance pass.

use std::cmp::Reverse;

use super::coarsen::WeightedGraph;
use super::BalanceBounds;

/// Connectivity of `vertex` to each part, reusing `scratch` (length `k`).
fn part_connectivity(
    graph: &WeightedGraph,
    assignment: &[usize],
    vertex: usize,
    scratch: &mut [usize],
    touched: &mut Vec<usize>,
) {
    for &p in touched.iter() {
        scratch[p] = 0;
    }
    touched.clear();
    for &(v, weight) in &graph.adjacency[vertex] {
        let p = assignment[v];
        if scratch[p] == 0 {
            touched.push(p);
        }
        scratch[p] += weight;
    }
}

/// Greedy boundary refinement.
///
/// Each pass visits every vertex once and moves boundary vertices to the
/// neighboring part with the largest positive cut reduction, or to a
/// lighter part at zero gain. Moves that would break `bounds` are skipped.
/// Stops after `max_passes` or when a pass moves nothing. Returns the number
/// of moves made.
pub(crate) fn refine(
    graph: &WeightedGraph,
    assignment: &mut [usize],
    part_weights: &mut [usize],
    bounds: BalanceBounds,
    max_passes: usize,
) -> usize {
    let k = part_weights.len();
    let mut scratch = vec![0usize; k];
    let mut touched = Vec::new();
    let mut total_moves = 0;

    for _ in 0..max_passes {
        let mut moves = 0;
        for u in 0..graph.node_count() {
            let own = assignment[u];
            part_connectivity(graph, assignment, u, &mut scratch, &mut touched);

            let internal = scratch[own];
            let best = touched
                .iter()
                .copied()
                .filter(|&p| p != own)
                .max_by_key(|&p| (scratch[p], Reverse(part_weights[p]), Reverse(p)));
            let Some(target) = best else { continue };

            let w = graph.vertex_weights[u];
            if part_weights[target] + w > bounds.upper || part_weights[own] < bounds.lower + w {
                continue;
            }

            let gain = scratch[target] as i64 - internal as i64;
            let evens_out = part_weights[target] + w < part_weights[own];
            if gain > 0 || (gain == 0 && evens_out) {
                assignment[u] = target;
                part_weights[own] -= w;
                part_weights[target] += w;
                moves += 1;
            }
        }
        total_moves += moves;
        if moves == 0 {
            break;
        }
    }

    total_moves
}

/// Force every part into `bounds` on a unit-weight graph.
///
/// Repeatedly moves one vertex from the heaviest part to the lightest,
/// choosing the vertex whose move costs the least cut. With unit weights
/// every move strictly shrinks the spread of part sizes, so this terminates
/// with all sizes inside `[bounds.lower, bounds.upper]` whenever
/// `bounds.lower <= n / k <= bounds.upper`. Returns the number of moves.
pub(crate) fn rebalance(
    graph: &WeightedGraph,
    assignment: &mut [usize],
    part_weights: &mut [usize],
    bounds: BalanceBounds,
) -> usize {
    let k = part_weights.len();
    let mut scratch = vec![0usize; k];
    let mut touched = Vec::new();
    let mut moves = 0;

    loop {
        let Some(heavy) = (0..k).max_by_key(|&p| (part_weights[p], Reverse(p))) else {
            break;
        };
        let Some(light) = (0..k).min_by_key(|&p| (part_weights[p], p)) else {
            break;
        };
        if part_weights[heavy] <= bounds.upper && part_weights[light] >= bounds.lower {
            break;
        }
        if part_weights[heavy] <= part_weights[light] + 1 {
            break;
        }

        let mut best: Option<(i64, usize)> = None;
        for u in 0..graph.node_count() {
            if assignment[u] != heavy {
                continue;
            }
            part_connectivity(graph, assignment, u, &mut scratch, &mut touched);
            let gain = scratch[light] as i64 - scratch[heavy] as i64;
            if best.map_or(true, |(g, _)| gain > g) {
                best = Some((gain, u));
            }
        }
        let Some((_, u)) = best else { break };

        let w = graph.vertex_weights[u];
        assignment[u] = light;
        part_weights[heavy] -= w;
        part_weights[light] += w;
        moves += 1;
    }

    moves
}
