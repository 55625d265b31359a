//! Integration test: subgraph matcher soundness and completeness.
//!
//! Every matcher is checked against an exhaustive search over all
//! injective maps on small graphs:
//! - every enumerated mapping passes independent edge-by-edge validation,
//! - the enumerated set equals the brute-force set (no misses, no repeats),
//! - `has_match` agrees with enumeration,
//! - VF2 and VF3 agree with each other.

use std::collections::HashSet;

use proptest::prelude::*;
use subgraph_retrieval::verifier::{Vf2, Vf3};
use subgraph_retrieval::{MatchGraph, MatcherKind, SubgraphMatcher};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// All injective, edge- and label-preserving maps from `query` into `host`.
fn brute_force(query: &MatchGraph, host: &MatchGraph) -> HashSet<Vec<usize>> {
    fn extend(
        query: &MatchGraph,
        host: &MatchGraph,
        partial: &mut Vec<usize>,
        used: &mut Vec<bool>,
        out: &mut HashSet<Vec<usize>>,
    ) {
        let u = partial.len();
        if u == query.node_count() {
            out.insert(partial.clone());
            return;
        }
        for v in 0..host.node_count() {
            if used[v] {
                continue;
            }
            if let (Some(a), Some(b)) = (query.label(u), host.label(v)) {
                if a != b {
                    continue;
                }
            }
            let consistent = query
                .neighbors(u)
                .iter()
                .filter(|&&w| w < u)
                .all(|&w| host.has_edge(partial[w], v));
            if !consistent {
                continue;
            }
            used[v] = true;
            partial.push(v);
            extend(query, host, partial, used, out);
            partial.pop();
            used[v] = false;
        }
    }

    let mut out = HashSet::new();
    let mut used = vec![false; host.node_count()];
    extend(query, host, &mut Vec::new(), &mut used, &mut out);
    out
}

fn graph_from_mask(n: usize, mask: &[bool], labels: Option<Vec<u32>>) -> MatchGraph {
    let mut edges = Vec::new();
    let mut bit = 0;
    for u in 0..n {
        for v in (u + 1)..n {
            if mask[bit] {
                edges.push((u, v));
            }
            bit += 1;
        }
    }
    MatchGraph::from_edges(n, edges, labels).unwrap()
}

/// Random graph with `min..=max` nodes and optional labels from `0..2`.
fn arb_graph(min: usize, max: usize, labeled: bool) -> impl Strategy<Value = MatchGraph> {
    (min..=max).prop_flat_map(move |n| {
        let pairs = n * n.saturating_sub(1) / 2;
        (
            proptest::collection::vec(prop::bool::weighted(0.45), pairs),
            proptest::collection::vec(0u32..2, n),
        )
            .prop_map(move |(mask, labels)| {
                graph_from_mask(n, &mask, if labeled { Some(labels) } else { None })
            })
    })
}

fn check_against_brute_force(matcher: &dyn SubgraphMatcher, query: &MatchGraph, host: &MatchGraph) {
    let expected = brute_force(query, host);
    let found: Vec<Vec<usize>> = matcher
        .enumerate_matches(query, host)
        .map(|m| m.targets().to_vec())
        .collect();

    for mapping in matcher.enumerate_matches(query, host) {
        mapping.is_valid(query, host).unwrap();
    }
    let unique: HashSet<Vec<usize>> = found.iter().cloned().collect();
    assert_eq!(unique.len(), found.len(), "{} repeated a mapping", matcher.name());
    assert_eq!(unique, expected, "{} enumerated a different set", matcher.name());
    assert_eq!(matcher.has_match(query, host), !expected.is_empty());
}

fn cycle(n: usize) -> MatchGraph {
    MatchGraph::from_edges(n, (0..n).map(|i| (i, (i + 1) % n)), None).unwrap()
}

fn petersen() -> MatchGraph {
    let mut edges = Vec::new();
    for i in 0..5 {
        edges.push((i, (i + 1) % 5));
        edges.push((i, i + 5));
        edges.push((i + 5, (i + 2) % 5 + 5));
    }
    MatchGraph::from_edges(10, edges, None).unwrap()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn matchers_agree_with_brute_force(
        query in arb_graph(0, 4, false),
        host in arb_graph(1, 7, false),
    ) {
        check_against_brute_force(&Vf2, &query, &host);
        check_against_brute_force(&Vf3, &query, &host);
    }

    #[test]
    fn labeled_matchers_agree_with_brute_force(
        query in arb_graph(1, 4, true),
        host in arb_graph(1, 7, true),
    ) {
        check_against_brute_force(&Vf2, &query, &host);
        check_against_brute_force(&Vf3, &query, &host);
    }

    #[test]
    fn every_subgraph_of_host_is_found(
        host in arb_graph(2, 8, false),
        keep in proptest::collection::vec(any::<bool>(), 8),
    ) {
        // drop nodes and some edges from the host: the rest must still match
        let nodes: Vec<usize> = (0..host.node_count()).filter(|&i| keep[i]).collect();
        let mut edges = Vec::new();
        for (a, &u) in nodes.iter().enumerate() {
            for (b, &v) in nodes.iter().enumerate().skip(a + 1) {
                if host.has_edge(u, v) && (u + v) % 3 != 0 {
                    edges.push((a, b));
                }
            }
        }
        let query = MatchGraph::from_edges(nodes.len(), edges, None).unwrap();
        for kind in [MatcherKind::Vf2, MatcherKind::Vf3] {
            let matcher = kind.matcher();
            prop_assert!(matcher.has_match(&query, &host), "{} missed a subgraph", kind);
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed graphs
// ---------------------------------------------------------------------------

#[test]
fn petersen_five_cycles() {
    // 12 five-cycles, each hit by 10 rotations/reflections of C5
    for kind in [MatcherKind::Vf2, MatcherKind::Vf3] {
        let matcher = kind.matcher();
        assert_eq!(matcher.enumerate_matches(&cycle(5), &petersen()).count(), 120, "{}", kind);
        // girth 5: no triangles or squares
        assert!(!matcher.has_match(&cycle(3), &petersen()));
        assert!(!matcher.has_match(&cycle(4), &petersen()));
    }
}

#[test]
fn ten_node_brute_force_cross_check() {
    let host = petersen();
    let query = MatchGraph::from_edges(5, vec![(0, 1), (1, 2), (2, 3), (1, 4)], None).unwrap();
    check_against_brute_force(&Vf2, &query, &host);
    check_against_brute_force(&Vf3, &query, &host);
}

#[test]
fn malformed_input_rejected() {
    let err = MatchGraph::from_edges(4, vec![(0, 1), (3, 4)], None).unwrap_err();
    assert_eq!(err.code(), "MALFORMED_GRAPH");
}

#[test]
fn matchers_run_concurrently() {
    let host = petersen();
    let query = cycle(5);
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let (host, query) = (&host, &query);
                s.spawn(move || {
                    let kind = if i % 2 == 0 { MatcherKind::Vf2 } else { MatcherKind::Vf3 };
                    kind.matcher().enumerate_matches(query, host).count()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 120);
        }
    });
}

#[test]
fn lazy_enumeration_stops_early() {
    let host = MatchGraph::from_edges(
        8,
        (0..8).flat_map(|u| (u + 1..8).map(move |v| (u, v))),
        None,
    )
    .unwrap();
    let query = cycle(4);
    let first_three: Vec<_> = Vf3.enumerate_matches(&query, &host).take(3).collect();
    assert_eq!(first_three.len(), 3);
    for m in &first_three {
        m.is_valid(&query, &host).unwrap();
    }
}
