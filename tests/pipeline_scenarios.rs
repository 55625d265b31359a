//! Integration test: end-to-end retrieval and verification.
//!
//! Covers:
//! - a query induced from one partition is retrieved near the top and
//!   verified against it,
//! - a query larger than every partition verifies negatively everywhere,
//! - asking for more candidates than partitions returns all of them,
//! - selector and partition-count errors surface with their kinds.

use rand::rngs::StdRng;
use rand::SeedableRng;
use subgraph_retrieval::synthetic::{self, SyntheticGraphConfig};
use subgraph_retrieval::{
    DistanceMetric, GinEmbedder, Graph, GraphError, MatcherKind, MeanPoolEmbedder, ModelState,
    Pipeline, PipelineConfig,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const NODES: usize = 50;
const PARTS: usize = 5;

/// 50-node random graph whose node features are one-hot node ids, so the
/// mean-pool embedding of a subgraph identifies which nodes it holds.
fn one_hot_random_graph(seed: u64) -> Graph {
    let rows: Vec<Vec<f32>> = (0..NODES)
        .map(|i| {
            let mut row = vec![0.0; NODES];
            row[i] = 1.0;
            row
        })
        .collect();
    synthetic::random_graph(NODES, 0.12, seed)
        .unwrap()
        .with_features(rows)
        .unwrap()
}

fn mean_pool_pipeline(seed: u64) -> Pipeline<MeanPoolEmbedder> {
    let config = PipelineConfig {
        num_partitions: PARTS,
        embedding_dim: NODES,
        ..PipelineConfig::default()
    };
    Pipeline::build(config, MeanPoolEmbedder::new(NODES, false), &one_hot_random_graph(seed)).unwrap()
}

// ---------------------------------------------------------------------------
// Scenario A: query from a known partition
// ---------------------------------------------------------------------------

#[test]
fn query_from_partition_two_is_retrieved_and_verified() {
    let pipeline = mean_pool_pipeline(11);
    let source = &pipeline.partitions()[2];
    let take = source.node_count().min(6);
    let local: Vec<usize> = (0..take).collect();
    let query = source.graph().induced_subgraph(&local).unwrap();

    let top2 = pipeline.retrieve(&query, 2).unwrap();
    assert!(top2.iter().any(|c| c.partition_id == 2), "top-2: {:?}", top2);

    let report = pipeline.query(&query).unwrap();
    assert_eq!(report.top_candidate.partition_id, 2);
    assert_eq!(report.verifications.len(), 2);
    for v in &report.verifications {
        assert!(v.is_match, "{} found no match", v.algorithm);
        assert!(v.mappings_enumerated >= 1);
        let mapping = v.first_mapping_dataset.as_ref().unwrap();
        assert_eq!(mapping.len(), query.node_count());
        assert!(mapping.targets().iter().all(|t| source.source_nodes().contains(t)));
    }
}

#[test]
fn sampled_run_reports_source_rank() {
    let pipeline = mean_pool_pipeline(4);
    let report = pipeline.run(2).unwrap();
    assert_eq!(report.source_partition, Some(2));
    assert_eq!(report.rank_of(2), Some(0));
    assert!(report.is_match());
    assert!(report.to_string().contains("source rank:      1"));
}

#[test]
fn gin_pipeline_verifies_source_partition() {
    let dataset = synthetic::planted_partition(&SyntheticGraphConfig {
        nodes: 120,
        communities: 6,
        p_in: 0.2,
        p_out: 0.005,
        feature_dim: 6,
        seed: 3,
    })
    .unwrap();
    let config = PipelineConfig {
        num_partitions: 6,
        embedding_dim: 8,
        hidden_dim: 16,
        ..PipelineConfig::default()
    };
    let embedder = GinEmbedder::new(ModelState::seeded(6, 16, 8, 1)).unwrap();
    let pipeline = Pipeline::build(config, embedder, &dataset).unwrap();

    let mut rng = StdRng::seed_from_u64(5);
    let sample = pipeline.sample_query(3, &mut rng).unwrap();
    let candidates = pipeline.retrieve(&sample.graph, 6).unwrap();
    let verdicts = pipeline
        .verify_candidates(&sample.graph, &candidates, MatcherKind::Vf3)
        .unwrap();
    let source = verdicts.iter().find(|(id, _)| *id == 3).unwrap();
    assert!(source.1, "query not found in its own partition");

    let report = pipeline.run(3).unwrap();
    let vf2 = report.verification("VF2").unwrap();
    let vf3 = report.verification("VF3").unwrap();
    assert_eq!(vf2.is_match, vf3.is_match);
    if !vf2.enumeration_truncated && !vf3.enumeration_truncated {
        assert_eq!(vf2.mappings_enumerated, vf3.mappings_enumerated);
    }
}

// ---------------------------------------------------------------------------
// Scenario B: query larger than every partition
// ---------------------------------------------------------------------------

#[test]
fn oversized_query_matches_nowhere() {
    let pipeline = mean_pool_pipeline(11);
    let largest = pipeline.partitions().iter().map(|p| p.node_count()).max().unwrap();
    let n = largest + 1;
    let query = Graph::new(n, (1..n).map(|i| (i - 1, i)))
        .unwrap()
        .with_features(vec![vec![1.0 / NODES as f32; NODES]; n])
        .unwrap();

    let candidates = pipeline.retrieve(&query, PARTS).unwrap();
    for kind in [MatcherKind::Vf2, MatcherKind::Vf3] {
        let verdicts = pipeline.verify_candidates(&query, &candidates, kind).unwrap();
        assert_eq!(verdicts.len(), PARTS);
        assert!(verdicts.iter().all(|&(_, found)| !found), "{}: {:?}", kind, verdicts);
    }

    // a negative result is a successful report, not an error
    let report = pipeline.query(&query).unwrap();
    assert!(!report.is_match());
    assert!(report.verifications.iter().all(|v| v.first_mapping.is_none()));
}

// ---------------------------------------------------------------------------
// Scenario C: k beyond the index size
// ---------------------------------------------------------------------------

#[test]
fn search_beyond_index_returns_all_sorted() {
    let pipeline = mean_pool_pipeline(11);
    let query = pipeline.partitions()[0].graph().clone();
    let candidates = pipeline.retrieve(&query, PARTS * 4).unwrap();

    assert_eq!(candidates.len(), PARTS);
    assert!(candidates.windows(2).all(|w| w[0].distance <= w[1].distance));
    let mut ids: Vec<usize> = candidates.iter().map(|c| c.partition_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..PARTS).collect::<Vec<_>>());
}

#[test]
fn cosine_metric_keeps_ordering_contract() {
    let config = PipelineConfig {
        num_partitions: PARTS,
        embedding_dim: NODES,
        metric: DistanceMetric::Cosine,
        ..PipelineConfig::default()
    };
    let pipeline =
        Pipeline::build(config, MeanPoolEmbedder::new(NODES, true), &one_hot_random_graph(8)).unwrap();
    let query = pipeline.partitions()[4].graph().clone();
    let candidates = pipeline.retrieve(&query, 100).unwrap();
    assert_eq!(candidates.len(), PARTS);
    assert_eq!(candidates[0].partition_id, 4);
    assert!(candidates[0].distance.abs() < 1e-5);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn selector_out_of_range_is_reported() {
    let pipeline = mean_pool_pipeline(11);
    let err = pipeline.run(PARTS).unwrap_err();
    assert_eq!(err.code(), "INVALID_PARTITION_SELECTOR");
    assert!(err.to_string().contains("[0, 5)"));
}

#[test]
fn too_many_partitions_is_reported() {
    let config = PipelineConfig {
        num_partitions: NODES + 1,
        embedding_dim: NODES,
        ..PipelineConfig::default()
    };
    let err = Pipeline::build(config, MeanPoolEmbedder::new(NODES, false), &one_hot_random_graph(1))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        GraphError::InvalidPartitionCount { k: 51, nodes: 50 }
    ));
}

#[test]
fn model_input_width_must_match_features() {
    let config = PipelineConfig {
        num_partitions: PARTS,
        embedding_dim: 4,
        ..PipelineConfig::default()
    };
    let embedder = GinEmbedder::new(ModelState::seeded(3, 8, 4, 1)).unwrap();
    let err = Pipeline::build(config, embedder, &one_hot_random_graph(1)).err().unwrap();
    assert_eq!(err.code(), "DIMENSION_MISMATCH");
}
