//! Initial k-way split of the coarsest graph by greedy region growing.

use std::cmp::Reverse;

use rand::seq::SliceRandom;
use rand::Rng;

use super::coarsen::WeightedGraph;

const UNASSIGNED: usize = usize::MAX;

/// Grow `k` regions one after another.
///
/// Each region starts from a random unassigned seed and absorbs the frontier
/// vertex most strongly connected to it until it reaches its share of the
/// remaining weight. When the frontier runs dry (disconnected graph) a new
/// seed is taken. The last region takes everything left over.
pub(crate) fn grow_regions<R: Rng>(graph: &WeightedGraph, k: usize, rng: &mut R) -> Vec<usize> {
    let n = graph.node_count();
    let mut assignment = vec![UNASSIGNED; n];
    let mut seeds: Vec<usize> = (0..n).collect();
    seeds.shuffle(rng);
    let mut seed_cursor = 0;

    let mut remaining = graph.total_weight();
    let mut connection = vec![0usize; n];

    for part in 0..k.saturating_sub(1) {
        let target = remaining / (k - part);
        let mut weight = 0;
        let mut frontier: Vec<usize> = Vec::new();

        loop {
            frontier.retain(|&v| assignment[v] == UNASSIGNED);
            let next = frontier
                .iter()
                .copied()
                .max_by_key(|&v| (connection[v], Reverse(v)))
                .or_else(|| {
                    while seed_cursor < n && assignment[seeds[seed_cursor]] != UNASSIGNED {
                        seed_cursor += 1;
                    }
                    seeds.get(seed_cursor).copied()
                });
            let Some(next) = next else { break };

            let w = graph.vertex_weights[next];
            // stop when taking `next` overshoots the target by more than
            // stopping now would undershoot it
            if weight > 0 && weight + w > target && weight + w - target > target - weight {
                break;
            }

            assignment[next] = part;
            weight += w;
            remaining -= w;

            for &(v, edge_weight) in &graph.adjacency[next] {
                if assignment[v] == UNASSIGNED {
                    if connection[v] == 0 {
                        frontier.push(v);
                    }
                    connection[v] += edge_weight;
                }
            }

            if weight >= target {
                break;
            }
        }

        for v in frontier {
            connection[v] = 0;
        }
    }

    let last = k.saturating_sub(1);
    for slot in assignment.iter_mut() {
        if *slot == UNASSIGNED {
            *slot = last;
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_vertex_assigned_in_range() {
        let g = Graph::new(20, (1..20).map(|i| (i - 1, i))).unwrap();
        let wg = WeightedGraph::from_graph(&g);
        let mut rng = StdRng::seed_from_u64(11);

        let assignment = grow_regions(&wg, 4, &mut rng);
        assert_eq!(assignment.len(), 20);
        assert!(assignment.iter().all(|&p| p < 4));
    }

    #[test]
    fn test_regions_are_roughly_even_on_a_path() {
        let g = Graph::new(40, (1..40).map(|i| (i - 1, i))).unwrap();
        let wg = WeightedGraph::from_graph(&g);
        let mut rng = StdRng::seed_from_u64(5);

        let assignment = grow_regions(&wg, 4, &mut rng);
        let mut sizes = [0usize; 4];
        for &p in &assignment {
            sizes[p] += 1;
        }
        // the first three regions stop at their share; the last absorbs the rest
        for &size in &sizes[..3] {
            assert_eq!(size, 10);
        }
        assert_eq!(sizes[3], 10);
    }

    #[test]
    fn test_disconnected_graph_reseeds() {
        let g = Graph::empty(9);
        let wg = WeightedGraph::from_graph(&g);
        let mut rng = StdRng::seed_from_u64(2);

        let assignment = grow_regions(&wg, 3, &mut rng);
        let mut sizes = [0usize; 3];
        for &p in &assignment {
            sizes[p] += 1;
        }
        assert_eq!(sizes, [3, 3, 3]);
    }

    #[test]
    fn test_single_part() {
        let g = Graph::empty(5);
        let wg = WeightedGraph::from_graph(&g);
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(grow_regions(&wg, 1, &mut rng), vec![0; 5]);
    }
}
