//! Pipeline configuration.
//!
//! Everything the run needs is passed in explicitly: partition count,
//! embedding dimension, distance metric, verifier variants, sampling and
//! dataset parameters. Loaded from JSON with every field optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::index::DistanceMetric;
use crate::partition::PartitionConfig;
use crate::sampling::QuerySampling;
use crate::synthetic::SyntheticGraphConfig;
use crate::verifier::MatcherKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of partitions `k` (default: 40)
    pub num_partitions: usize,
    /// Embedding dimension `D` (default: 16)
    pub embedding_dim: usize,
    /// Hidden width of the GIN encoder (default: 64)
    pub hidden_dim: usize,
    /// Retrieval distance (default: squared Euclidean)
    pub metric: DistanceMetric,
    /// Verifier variants to run, in order (default: VF3 then VF2)
    pub verifiers: Vec<MatcherKind>,
    /// Stop counting mappings after this many (default: 1000)
    pub enumeration_limit: usize,
    /// Seed for query sampling (default: 42)
    pub seed: u64,
    pub partitioning: PartitionConfig,
    pub query: QuerySampling,
    pub dataset: SyntheticGraphConfig,
    /// Frozen encoder weights; a seeded model is used when absent
    pub model_path: Option<PathBuf>,
    /// Seed for the fallback encoder weights (default: 1)
    pub model_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_partitions: 40,
            embedding_dim: 16,
            hidden_dim: 64,
            metric: DistanceMetric::SquaredEuclidean,
            verifiers: vec![MatcherKind::Vf3, MatcherKind::Vf2],
            enumeration_limit: 1000,
            seed: 42,
            partitioning: PartitionConfig::default(),
            query: QuerySampling::default(),
            dataset: SyntheticGraphConfig::default(),
            model_path: None,
            model_seed: 1,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_partitions == 0 {
            return Err(GraphError::InvalidConfig("num_partitions must be > 0".into()));
        }
        if self.embedding_dim == 0 {
            return Err(GraphError::InvalidConfig("embedding_dim must be > 0".into()));
        }
        let tolerance = self.partitioning.imbalance_tolerance;
        if !(0.0..1.0).contains(&tolerance) {
            return Err(GraphError::InvalidConfig(format!(
                "imbalance_tolerance must be in [0, 1), got {}",
                tolerance
            )));
        }
        if self.verifiers.is_empty() {
            return Err(GraphError::InvalidConfig("at least one verifier is required".into()));
        }
        if self.query.max_nodes == 0 {
            return Err(GraphError::InvalidConfig("query.max_nodes must be > 0".into()));
        }
        Ok(())
    }
}
