//! Subgraph retrieval over a partitioned graph.
//!
//! Answers "which region of this large graph contains my small query
//! graph?" in three stages:
//! 1. [`partition`]: split the dataset into `k` balanced shards with a small
//!    edge cut.
//! 2. [`embedder`] + [`index`]: represent each shard by a fixed-size vector
//!    and retrieve the shards nearest to the query's vector.
//! 3. [`verifier`]: prove or refute membership with an exact
//!    subgraph-isomorphism search against the retrieved shard.
//!
//! [`pipeline::Pipeline`] wires the stages together and times each one.

pub mod embedder;
pub mod error;
pub mod graph;
pub mod index;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod sampling;
pub mod synthetic;
pub mod verifier;

pub use embedder::{EmbeddingVector, GinEmbedder, MeanPoolEmbedder, ModelState, QueryEmbedder};
pub use error::{GraphError, Result};
pub use graph::{Graph, Partition};
pub use index::{Candidate, DistanceMetric, EmbeddingIndex, IndexEntry};
pub use partition::{GraphPartitioner, PartitionConfig};
pub use pipeline::{Pipeline, PipelineConfig, QueryReport};
pub use verifier::{MatchGraph, Mapping, MatcherKind, SubgraphMatcher};
