//! Run and query reports.
//!
//! Reports are plain data: `Serialize` for `--json` output and `Display`
//! for the human-readable text the command-line front end prints.

use std::fmt;

use serde::Serialize;

use crate::index::Candidate;
use crate::metrics::{Stage, StageTimings};
use crate::partition::PartitionStats;
use crate::verifier::Mapping;

/// Dataset and partitioning overview, printed once per run.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub nodes: usize,
    pub edges: usize,
    pub feature_dim: usize,
    pub labeled: bool,
    pub num_partitions: usize,
    pub partitioning: PartitionStats,
    pub build_timings: StageTimings,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset")?;
        writeln!(f, "  nodes:            {}", self.nodes)?;
        writeln!(f, "  edges:            {}", self.edges)?;
        writeln!(f, "  feature dim:      {}", self.feature_dim)?;
        writeln!(f, "  labeled:          {}", self.labeled)?;
        writeln!(f, "Partitioning")?;
        writeln!(f, "  partitions:       {}", self.num_partitions)?;
        writeln!(f, "  sizes:            {:?}", self.partitioning.sizes)?;
        writeln!(
            f,
            "  balance bounds:   [{}, {}]",
            self.partitioning.bounds.lower, self.partitioning.bounds.upper
        )?;
        writeln!(f, "  edge cut:         {}", self.partitioning.edge_cut)?;
        writeln!(f, "  imbalance:        {:.3}", self.partitioning.imbalance)?;
        writeln!(f, "  coarsening levels: {}", self.partitioning.coarsening_levels)?;
        for timing in self.build_timings.entries() {
            writeln!(f, "  {:<17} {:.3} ms", format!("{}:", timing.stage.label()), timing.elapsed_ms)?;
        }
        Ok(())
    }
}

/// Outcome of one verifier variant against the chosen candidate.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub algorithm: String,
    pub is_match: bool,
    /// First mapping in partition-local host ids.
    pub first_mapping: Option<Mapping>,
    /// The same mapping translated to dataset node ids.
    pub first_mapping_dataset: Option<Mapping>,
    /// Mappings enumerated, capped at the configured limit.
    pub mappings_enumerated: usize,
    /// More mappings exist beyond the cap.
    pub enumeration_truncated: bool,
    pub states_explored: u64,
    pub elapsed_ms: f64,
}

/// Everything reported about one query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query_nodes: usize,
    pub query_edges: usize,
    /// Partition the query was sampled from, when known.
    pub source_partition: Option<usize>,
    pub top_candidate: Candidate,
    pub candidates: Vec<Candidate>,
    pub verifications: Vec<VerificationReport>,
    pub timings: StageTimings,
}

impl QueryReport {
    /// Rank of `partition_id` among the candidates, 0 for the nearest.
    pub fn rank_of(&self, partition_id: usize) -> Option<usize> {
        self.candidates
            .iter()
            .position(|c| c.partition_id == partition_id)
    }

    pub fn verification(&self, algorithm: &str) -> Option<&VerificationReport> {
        self.verifications.iter().find(|v| v.algorithm == algorithm)
    }

    /// Whether every verifier that ran found a match.
    pub fn is_match(&self) -> bool {
        !self.verifications.is_empty() && self.verifications.iter().all(|v| v.is_match)
    }
}

impl fmt::Display for QueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Query")?;
        writeln!(f, "  nodes:            {}", self.query_nodes)?;
        writeln!(f, "  edges:            {}", self.query_edges)?;
        if let Some(source) = self.source_partition {
            writeln!(f, "  sampled from:     partition {}", source)?;
            match self.rank_of(source) {
                Some(rank) => writeln!(f, "  source rank:      {}", rank + 1)?,
                None => writeln!(f, "  source rank:      not retrieved")?,
            }
        }
        writeln!(f, "Retrieval")?;
        writeln!(
            f,
            "  top candidate:    partition {} (distance {:.6})",
            self.top_candidate.partition_id, self.top_candidate.distance
        )?;
        let shown: Vec<String> = self
            .candidates
            .iter()
            .take(5)
            .map(|c| format!("{}:{:.4}", c.partition_id, c.distance))
            .collect();
        writeln!(f, "  nearest:          {}", shown.join(" "))?;
        for stage in [Stage::QueryEmbedding, Stage::Retrieval] {
            if let Some(ms) = self.timings.get(&stage) {
                writeln!(f, "  {:<17} {:.3} ms", format!("{}:", stage.label()), ms)?;
            }
        }
        writeln!(f, "Verification")?;
        for v in &self.verifications {
            write!(
                f,
                "  {}: match={} mappings={}{} states={} time={:.3} ms",
                v.algorithm,
                v.is_match,
                v.mappings_enumerated,
                if v.enumeration_truncated { "+" } else { "" },
                v.states_explored,
                v.elapsed_ms
            )?;
            writeln!(f)?;
            if let Some(mapping) = &v.first_mapping_dataset {
                writeln!(f, "    first mapping (query -> dataset): {}", mapping)?;
            }
        }
        Ok(())
    }
}
