//! Retrieval-and-verification pipeline.
//!
//! Wires the pieces together:
//!
//! ```text
//! dataset ─► GraphPartitioner ─► partitions ─► QueryEmbedder ─► EmbeddingIndex
//!
//! query ─► QueryEmbedder ─► search ─► top candidate ─► SubgraphMatcher(s)
//! ```
//!
//! [`Pipeline::build`] does the one-off work (partition, embed every
//! partition in parallel, build the index). [`Pipeline::query`] then answers
//! any number of queries; it takes `&self`, so a built pipeline can serve
//! queries from several threads. Every stage is timed separately.

mod config;
mod report;

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::embedder::QueryEmbedder;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, Partition};
use crate::index::{Candidate, EmbeddingIndex, IndexEntry};
use crate::metrics::{elapsed_ms, Stage, StageTimings};
use crate::partition::GraphPartitioner;
use crate::sampling::{self, SampledQuery};
use crate::verifier::{MatchGraph, MatcherKind, SubgraphMatcher};

pub use config::PipelineConfig;
pub use report::{DatasetSummary, QueryReport, VerificationReport};

/// A partitioned, embedded and indexed dataset ready for queries.
pub struct Pipeline<E> {
    config: PipelineConfig,
    embedder: E,
    partitions: Vec<Partition>,
    index: EmbeddingIndex,
    summary: DatasetSummary,
}

impl<E: QueryEmbedder> Pipeline<E> {
    /// Partition `dataset`, embed every partition and build the index.
    ///
    /// Fails with `InvalidConfig` on a bad configuration, with
    /// `DimensionMismatch` when the embedder's output width differs from
    /// `embedding_dim`, and with whatever partitioning or embedding raises.
    pub fn build(config: PipelineConfig, embedder: E, dataset: &Graph) -> Result<Self> {
        config.validate()?;
        if embedder.dimension() != config.embedding_dim {
            return Err(GraphError::dimension(
                config.embedding_dim,
                embedder.dimension(),
                "embedder output vs configured embedding_dim",
            ));
        }

        let mut timings = StageTimings::new();
        let partitioner = GraphPartitioner::new(config.partitioning.clone());
        let (partitions, stats) = timings.measure(Stage::Partitioning, || {
            partitioner.partition_with_stats(dataset, config.num_partitions)
        })?;

        // collect() joins every worker before the index is touched
        let entries = timings.measure(Stage::PartitionEmbedding, || {
            embed_partitions(&embedder, &partitions)
        })?;

        let mut index = EmbeddingIndex::new(config.embedding_dim, config.metric);
        timings.measure(Stage::IndexBuild, || index.build(entries))?;

        tracing::info!(
            partitions = partitions.len(),
            dimension = config.embedding_dim,
            total_ms = timings.total_ms(),
            "pipeline built"
        );

        let summary = DatasetSummary {
            nodes: dataset.node_count(),
            edges: dataset.edge_count(),
            feature_dim: dataset.feature_dim(),
            labeled: dataset.labels().is_some(),
            num_partitions: partitions.len(),
            partitioning: stats,
            build_timings: timings,
        };

        Ok(Self {
            config,
            embedder,
            partitions,
            index,
            summary,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn summary(&self) -> &DatasetSummary {
        &self.summary
    }

    /// Partition `id`, or `InvalidPartitionSelector` when out of range.
    pub fn partition(&self, id: usize) -> Result<&Partition> {
        self.partitions
            .get(id)
            .ok_or(GraphError::InvalidPartitionSelector {
                selector: id,
                partitions: self.partitions.len(),
            })
    }

    /// Draw a validation query from inside partition `selector`.
    ///
    /// `source_nodes` of the result are partition-local ids.
    pub fn sample_query<R: Rng>(&self, selector: usize, rng: &mut R) -> Result<SampledQuery> {
        let partition = self.partition(selector)?;
        sampling::sample_query(partition.graph(), self.config.query, rng)
    }

    /// Embed `query` and return the `k` nearest partitions.
    pub fn retrieve(&self, query: &Graph, k: usize) -> Result<Vec<Candidate>> {
        let vector = self.embedder.embed(query)?;
        self.index.search(&vector, k)
    }

    /// Embed, retrieve, and verify `query` against the top candidate with
    /// every configured verifier.
    ///
    /// A negative verification is a successful result (`is_match == false`),
    /// not an error.
    pub fn query(&self, query: &Graph) -> Result<QueryReport> {
        let mut timings = StageTimings::new();

        let vector = timings.measure(Stage::QueryEmbedding, || self.embedder.embed(query))?;
        let candidates = timings.measure(Stage::Retrieval, || {
            self.index.search(&vector, self.partitions.len())
        })?;
        let top_candidate = *candidates.first().ok_or(GraphError::IndexNotBuilt)?;
        let host = self.partition(top_candidate.partition_id)?;

        let query_graph = MatchGraph::from(query);
        let host_graph = MatchGraph::from(host.graph());
        let mut verifications = Vec::with_capacity(self.config.verifiers.len());
        for kind in &self.config.verifiers {
            let matcher = kind.matcher();
            let report = verify(
                matcher.as_ref(),
                &query_graph,
                &host_graph,
                host.source_nodes(),
                self.config.enumeration_limit,
            );
            timings.record(Stage::Verification(report.algorithm.clone()), report.elapsed_ms);
            tracing::info!(
                algorithm = %report.algorithm,
                candidate = top_candidate.partition_id,
                is_match = report.is_match,
                mappings = report.mappings_enumerated,
                elapsed_ms = report.elapsed_ms,
                "verified top candidate"
            );
            verifications.push(report);
        }

        Ok(QueryReport {
            query_nodes: query.node_count(),
            query_edges: query.edge_count(),
            source_partition: None,
            top_candidate,
            candidates,
            verifications,
            timings,
        })
    }

    /// Check `query` against every listed candidate in parallel.
    ///
    /// Returns `(partition_id, has_match)` in candidate order.
    pub fn verify_candidates(
        &self,
        query: &Graph,
        candidates: &[Candidate],
        kind: MatcherKind,
    ) -> Result<Vec<(usize, bool)>> {
        let query_graph = MatchGraph::from(query);
        let matcher = kind.matcher();
        candidates
            .par_iter()
            .map(|candidate| {
                let host = self.partition(candidate.partition_id)?;
                let host_graph = MatchGraph::from(host.graph());
                Ok((candidate.partition_id, matcher.has_match(&query_graph, &host_graph)))
            })
            .collect()
    }

    /// Sample a query from partition `selector` and run it end to end.
    ///
    /// The sampling seed is derived from `config.seed` and the selector, so
    /// a run is reproducible.
    pub fn run(&self, selector: usize) -> Result<QueryReport> {
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(selector as u64));
        let sample = self.sample_query(selector, &mut rng)?;
        tracing::debug!(
            selector,
            anchor = sample.anchor,
            nodes = sample.graph.node_count(),
            "sampled validation query"
        );
        let mut report = self.query(&sample.graph)?;
        report.source_partition = Some(selector);
        Ok(report)
    }
}

fn embed_partitions<E: QueryEmbedder>(embedder: &E, partitions: &[Partition]) -> Result<Vec<IndexEntry>> {
    partitions
        .par_iter()
        .map(|partition| {
            let vector = embedder.embed(partition.graph()).map_err(|err| match err {
                GraphError::EmbedderFailure(msg) => {
                    GraphError::EmbedderFailure(format!("partition {}: {}", partition.id(), msg))
                }
                other => other,
            })?;
            Ok(IndexEntry::new(partition.id(), vector))
        })
        .collect()
}

/// Run one matcher: existence check, then a capped enumeration.
fn verify(
    matcher: &dyn SubgraphMatcher,
    query: &MatchGraph,
    host: &MatchGraph,
    host_to_dataset: &[usize],
    limit: usize,
) -> VerificationReport {
    let started = Instant::now();
    let is_match = matcher.has_match(query, host);

    let limit = limit.max(1);
    let mut matches = matcher.enumerate_matches(query, host);
    let first_mapping = matches.next();
    let mut enumerated = usize::from(first_mapping.is_some());
    while enumerated > 0 && enumerated < limit && matches.next().is_some() {
        enumerated += 1;
    }
    let enumeration_truncated = enumerated == limit && matches.next().is_some();
    debug_assert_eq!(is_match, first_mapping.is_some());

    VerificationReport {
        algorithm: matcher.name().to_string(),
        is_match,
        first_mapping_dataset: first_mapping
            .as_ref()
            .map(|m| m.translate(host_to_dataset)),
        first_mapping,
        mappings_enumerated: enumerated,
        enumeration_truncated,
        states_explored: matches.states_explored(),
        elapsed_ms: elapsed_ms(started),
    }
}
