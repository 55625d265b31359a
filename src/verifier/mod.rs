//! Exact subgraph-isomorphism verification.
//!
//! A match is an injective map from query nodes to host nodes under which
//! every query edge lands on a host edge (non-induced subgraph
//! isomorphism, a.k.a. monomorphism). Node labels, when both graphs carry
//! them, must agree.
//!
//! # Overview
//!
//! All matchers share one state-space search ([`Matches`]): a partial mapping
//! is extended one query node at a time in a precomputed order, each
//! candidate pair is checked for
//! - adjacency consistency with every already-mapped query neighbor,
//! - one-level look-ahead (unmapped neighbors adjacent to the mapping),
//! - two-level look-ahead (all unmapped neighbors),
//! - label compatibility,
//!
//! and the search backtracks on failure. Strategies implement
//! [`SubgraphMatcher::plan`] and differ only in node ordering and in how
//! much they prune up front:
//!
//! - [`Vf2`]: breadth-first order from the highest-degree node.
//! - [`Vf3`]: most-constrained-first order over precomputed candidate
//!   domains (label, degree, neighbor-degree dominance) plus global
//!   degree-sequence and label-count rejection.
//!
//! Both agree on whether a match exists and enumerate the same set of
//! mappings; they may produce them in a different order.
//!
//! Matchers hold no state between calls. Each `enumerate_matches` call runs
//! a fresh search; calls on different graph pairs can run concurrently.

mod state;
mod vf2;
mod vf3;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::Graph;

pub use state::{MatchPlan, Matches};
pub use vf2::Vf2;
pub use vf3::Vf3;

/// Verifier-side graph representation: sorted adjacency plus optional labels.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchGraph {
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
    labels: Option<Vec<u32>>,
}

impl MatchGraph {
    /// Build from a raw edge list.
    ///
    /// Fails with `MalformedGraph` if an edge references a node outside
    /// `0..num_nodes` or the label count differs from the node count.
    pub fn from_edges<I>(num_nodes: usize, edges: I, labels: Option<Vec<u32>>) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let graph = Graph::new(num_nodes, edges)?;
        let graph = match labels {
            Some(labels) => graph.with_labels(labels)?,
            None => graph,
        };
        Ok(Self::from(&graph))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency[u].binary_search(&v).is_ok()
    }

    pub fn label(&self, node: usize) -> Option<u32> {
        self.labels.as_ref().map(|l| l[node])
    }

    pub fn is_labeled(&self) -> bool {
        self.labels.is_some()
    }
}

impl From<&Graph> for MatchGraph {
    fn from(graph: &Graph) -> Self {
        Self {
            adjacency: (0..graph.node_count())
                .map(|u| graph.neighbors(u).to_vec())
                .collect(),
            edge_count: graph.edge_count(),
            labels: graph.labels().map(<[u32]>::to_vec),
        }
    }
}

/// Label predicate: unlabeled graphs accept every pairing.
pub(crate) fn labels_compatible(query: &MatchGraph, u: usize, host: &MatchGraph, v: usize) -> bool {
    match (query.label(u), host.label(v)) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// A complete match: `targets[q]` is the host node for query node `q`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Mapping {
    targets: Vec<usize>,
}

impl Mapping {
    pub fn new(targets: Vec<usize>) -> Self {
        Self { targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, query_node: usize) -> Option<usize> {
        self.targets.get(query_node).copied()
    }

    /// `(query_node, host_node)` pairs in query-node order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets.iter().copied().enumerate()
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Independently check that this is a valid match of `query` in `host`:
    /// total, injective, in range, edge- and label-preserving.
    pub fn is_valid(&self, query: &MatchGraph, host: &MatchGraph) -> Result<()> {
        if self.targets.len() != query.node_count() {
            return Err(GraphError::MalformedGraph(format!(
                "mapping covers {} of {} query nodes",
                self.targets.len(),
                query.node_count()
            )));
        }
        let mut used = vec![false; host.node_count()];
        for (q, h) in self.pairs() {
            if h >= host.node_count() {
                return Err(GraphError::MalformedGraph(format!(
                    "query node {} maps to unknown host node {}",
                    q, h
                )));
            }
            if std::mem::replace(&mut used[h], true) {
                return Err(GraphError::MalformedGraph(format!(
                    "host node {} is the image of two query nodes",
                    h
                )));
            }
            if !labels_compatible(query, q, host, h) {
                return Err(GraphError::MalformedGraph(format!(
                    "query node {} and host node {} carry different labels",
                    q, h
                )));
            }
        }
        for u in 0..query.node_count() {
            for &w in query.neighbors(u) {
                if !host.has_edge(self.targets[u], self.targets[w]) {
                    return Err(GraphError::MalformedGraph(format!(
                        "query edge ({}, {}) maps to host non-edge ({}, {})",
                        u, w, self.targets[u], self.targets[w]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Translate host ids through `lookup` (e.g. partition-local to dataset ids).
    pub fn translate(&self, lookup: &[usize]) -> Mapping {
        Mapping {
            targets: self.targets.iter().map(|&h| lookup[h]).collect(),
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (q, h)) in self.pairs().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", q, h)?;
        }
        write!(f, "}}")
    }
}

/// A subgraph-isomorphism strategy.
///
/// Implementors only decide the search plan; the search itself, and
/// therefore correctness, is shared.
pub trait SubgraphMatcher: Send + Sync {
    /// Short algorithm name for reports.
    fn name(&self) -> &'static str;

    /// Visiting order and up-front pruning for one `(query, host)` pair.
    fn plan(&self, query: &MatchGraph, host: &MatchGraph) -> MatchPlan;

    /// Lazily enumerate every match. Each call starts a fresh search.
    fn enumerate_matches<'a>(&self, query: &'a MatchGraph, host: &'a MatchGraph) -> Matches<'a> {
        Matches::new(query, host, self.plan(query, host))
    }

    /// Whether at least one match exists. Stops at the first one.
    fn has_match(&self, query: &MatchGraph, host: &MatchGraph) -> bool {
        self.enumerate_matches(query, host).next().is_some()
    }

    fn first_match(&self, query: &MatchGraph, host: &MatchGraph) -> Option<Mapping> {
        self.enumerate_matches(query, host).next()
    }
}

/// Configurable choice of matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Vf2,
    Vf3,
}

impl MatcherKind {
    pub fn matcher(&self) -> Box<dyn SubgraphMatcher> {
        match self {
            MatcherKind::Vf2 => Box::new(Vf2),
            MatcherKind::Vf3 => Box::new(Vf3),
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.matcher().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> MatchGraph {
        MatchGraph::from_edges(n, (1..n).map(|i| (i - 1, i)), None).unwrap()
    }

    fn cycle(n: usize) -> MatchGraph {
        MatchGraph::from_edges(n, (0..n).map(|i| (i, (i + 1) % n)), None).unwrap()
    }

    fn both() -> [Box<dyn SubgraphMatcher>; 2] {
        [MatcherKind::Vf2.matcher(), MatcherKind::Vf3.matcher()]
    }

    #[test]
    fn test_from_edges_rejects_unknown_node() {
        let err = MatchGraph::from_edges(3, vec![(0, 5)], None).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_GRAPH");
        let err = MatchGraph::from_edges(3, vec![(0, 1)], Some(vec![1])).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_GRAPH");
    }

    #[test]
    fn test_path_in_cycle() {
        for m in both() {
            assert!(m.has_match(&path(3), &cycle(5)), "{}", m.name());
            // a 5-cycle holds 5 rotations x 2 directions of a 3-path
            assert_eq!(m.enumerate_matches(&path(3), &cycle(5)).count(), 10, "{}", m.name());
        }
    }

    #[test]
    fn test_triangle_not_in_bipartite_square() {
        for m in both() {
            assert!(!m.has_match(&cycle(3), &cycle(4)), "{}", m.name());
            assert_eq!(m.enumerate_matches(&cycle(3), &cycle(4)).count(), 0);
        }
    }

    #[test]
    fn test_non_induced_semantics() {
        // a path 0-1-2 matches inside a triangle even though the host has
        // the extra edge (0, 2)
        for m in both() {
            let mapping = m.first_match(&path(3), &cycle(3)).unwrap();
            mapping.is_valid(&path(3), &cycle(3)).unwrap();
        }
    }

    #[test]
    fn test_query_larger_than_host() {
        for m in both() {
            assert!(!m.has_match(&path(6), &path(5)));
        }
    }

    #[test]
    fn test_empty_query_matches_once() {
        let empty = MatchGraph::from_edges(0, Vec::new(), None).unwrap();
        for m in both() {
            let all: Vec<_> = m.enumerate_matches(&empty, &cycle(4)).collect();
            assert_eq!(all, vec![Mapping::new(vec![])]);
        }
    }

    #[test]
    fn test_labels_restrict_matches() {
        let query = MatchGraph::from_edges(2, vec![(0, 1)], Some(vec![1, 2])).unwrap();
        let host = MatchGraph::from_edges(3, vec![(0, 1), (1, 2)], Some(vec![1, 2, 1])).unwrap();
        for m in both() {
            let all: Vec<_> = m.enumerate_matches(&query, &host).collect();
            // query 0 (label 1) -> host 0 or 2, query 1 (label 2) -> host 1
            assert_eq!(all.len(), 2, "{}", m.name());
            assert!(all.iter().all(|map| map.get(1) == Some(1)));
        }

        let wrong = MatchGraph::from_edges(2, vec![(0, 1)], Some(vec![2, 2])).unwrap();
        for m in both() {
            assert!(!m.has_match(&wrong, &host));
        }
    }

    #[test]
    fn test_unlabeled_query_ignores_host_labels() {
        let host = MatchGraph::from_edges(2, vec![(0, 1)], Some(vec![4, 5])).unwrap();
        for m in both() {
            assert_eq!(m.enumerate_matches(&path(2), &host).count(), 2);
        }
    }

    #[test]
    fn test_enumeration_restarts_per_call() {
        let m = Vf3;
        let q = path(2);
        let h = cycle(4);
        let first: Vec<_> = m.enumerate_matches(&q, &h).collect();
        let second: Vec<_> = m.enumerate_matches(&q, &h).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
    }

    #[test]
    fn test_mapping_validation_catches_errors() {
        let q = path(3);
        let h = path(3);
        assert!(Mapping::new(vec![0, 1, 2]).is_valid(&q, &h).is_ok());
        assert!(Mapping::new(vec![0, 2, 1]).is_valid(&q, &h).is_err());
        assert!(Mapping::new(vec![0, 1, 1]).is_valid(&q, &h).is_err());
        assert!(Mapping::new(vec![0, 1]).is_valid(&q, &h).is_err());
        assert!(Mapping::new(vec![0, 1, 9]).is_valid(&q, &h).is_err());
    }

    #[test]
    fn test_mapping_display_and_translate() {
        let m = Mapping::new(vec![2, 0]);
        assert_eq!(m.to_string(), "{0: 2, 1: 0}");
        assert_eq!(m.translate(&[10, 11, 12]).targets(), &[12, 10]);
    }

    #[test]
    fn test_matcher_kind_names() {
        assert_eq!(MatcherKind::Vf2.to_string(), "VF2");
        assert_eq!(MatcherKind::Vf3.to_string(), "VF3");
        let kinds: Vec<MatcherKind> = serde_json::from_str("[\"vf3\", \"vf2\"]").unwrap();
        assert_eq!(kinds, vec![MatcherKind::Vf3, MatcherKind::Vf2]);
    }
}
