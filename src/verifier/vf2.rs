//! Base VF2 ordering.

use std::cmp::Reverse;
use std::collections::VecDeque;

use super::state::MatchPlan;
use super::{MatchGraph, SubgraphMatcher};

/// Classic VF2: breadth-first visiting order, each connected component
/// rooted at its highest-degree node. Only constant-time size checks are
/// done before the search.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vf2;

impl SubgraphMatcher for Vf2 {
    fn name(&self) -> &'static str {
        "VF2"
    }

    fn plan(&self, query: &MatchGraph, host: &MatchGraph) -> MatchPlan {
        if query.node_count() > host.node_count() || query.edge_count() > host.edge_count() {
            return MatchPlan::rejected();
        }
        MatchPlan::with_order(query, bfs_order(query), None)
    }
}

fn bfs_order(query: &MatchGraph) -> Vec<usize> {
    let n = query.node_count();
    let mut roots: Vec<usize> = (0..n).collect();
    roots.sort_by_key(|&u| (Reverse(query.degree(u)), u));

    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();
    for root in roots {
        if seen[root] {
            continue;
        }
        seen[root] = true;
        queue.push_back(root);
        while let Some(u) = queue.pop_front() {
            order.push(u);
            for &w in query.neighbors(u) {
                if !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
    }
    order
}
