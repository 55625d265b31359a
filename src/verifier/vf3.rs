//! Refined ordering and up-front pruning in the style of VF3.

use std::cmp::Reverse;
use std::collections::HashMap;

use super::state::MatchPlan;
use super::{labels_compatible, MatchGraph, SubgraphMatcher};

/// VF3-style matcher.
///
/// Before searching it
/// - rejects pairs whose degree sequences or label counts cannot fit,
/// - computes each query node's candidate domain: host nodes with a
///   compatible label, at least the same degree, and a neighbor-degree
///   profile that dominates the query node's,
///
/// then visits query nodes most-constrained first: most already-ordered
/// neighbors, then smallest domain, then highest degree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vf3;

impl SubgraphMatcher for Vf3 {
    fn name(&self) -> &'static str {
        "VF3"
    }

    fn plan(&self, query: &MatchGraph, host: &MatchGraph) -> MatchPlan {
        if query.node_count() > host.node_count() || query.edge_count() > host.edge_count() {
            return MatchPlan::rejected();
        }
        if !degree_sequence_fits(query, host) || !label_counts_fit(query, host) {
            return MatchPlan::rejected();
        }

        let query_profiles = neighbor_degree_profiles(query);
        let host_profiles = neighbor_degree_profiles(host);
        let host_n = host.node_count();

        let mut domain = vec![false; query.node_count() * host_n];
        let mut domain_sizes = vec![0usize; query.node_count()];
        for u in 0..query.node_count() {
            for v in 0..host_n {
                let allowed = labels_compatible(query, u, host, v)
                    && query.degree(u) <= host.degree(v)
                    && dominated(&query_profiles[u], &host_profiles[v]);
                if allowed {
                    domain[u * host_n + v] = true;
                    domain_sizes[u] += 1;
                }
            }
            if domain_sizes[u] == 0 {
                return MatchPlan::rejected();
            }
        }

        let order = constrained_order(query, &domain_sizes);
        MatchPlan::with_order(query, order, Some(domain))
    }
}

/// Neighbor degrees of every node, sorted descending.
fn neighbor_degree_profiles(graph: &MatchGraph) -> Vec<Vec<usize>> {
    (0..graph.node_count())
        .map(|u| {
            let mut degrees: Vec<usize> = graph.neighbors(u).iter().map(|&w| graph.degree(w)).collect();
            degrees.sort_unstable_by(|a, b| b.cmp(a));
            degrees
        })
        .collect()
}

/// `small` fits element-wise under the largest entries of `large`; both
/// sorted descending.
fn dominated(small: &[usize], large: &[usize]) -> bool {
    small.len() <= large.len() && small.iter().zip(large).all(|(s, l)| s <= l)
}

fn degree_sequence_fits(query: &MatchGraph, host: &MatchGraph) -> bool {
    let sorted = |g: &MatchGraph| {
        let mut d: Vec<usize> = (0..g.node_count()).map(|u| g.degree(u)).collect();
        d.sort_unstable_by(|a, b| b.cmp(a));
        d
    };
    dominated(&sorted(query), &sorted(host))
}

fn label_counts_fit(query: &MatchGraph, host: &MatchGraph) -> bool {
    if !query.is_labeled() || !host.is_labeled() {
        return true;
    }
    let count = |g: &MatchGraph| {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for u in 0..g.node_count() {
            if let Some(label) = g.label(u) {
                *counts.entry(label).or_default() += 1;
            }
        }
        counts
    };
    let host_counts = count(host);
    count(query)
        .into_iter()
        .all(|(label, n)| host_counts.get(&label).copied().unwrap_or(0) >= n)
}

fn constrained_order(query: &MatchGraph, domain_sizes: &[usize]) -> Vec<usize> {
    let n = query.node_count();
    let mut placed = vec![false; n];
    let mut ordered_nbrs = vec![0usize; n];
    let mut order = Vec::with_capacity(n);

    while order.len() < n {
        let Some(next) = (0..n).filter(|&u| !placed[u]).max_by_key(|&u| {
            (
                ordered_nbrs[u],
                Reverse(domain_sizes[u]),
                query.degree(u),
                Reverse(u),
            )
        }) else {
            break;
        };
        placed[next] = true;
        order.push(next);
        for &w in query.neighbors(next) {
            ordered_nbrs[w] += 1;
        }
    }
    order
}
