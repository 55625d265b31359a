//! Query sampling for validation runs.
//!
//! A query is drawn from inside a known graph (normally one partition) so
//! the pipeline can check that retrieval and verification find it again:
//! pick a random anchor, take its k-hop neighborhood, keep a random subset
//! of at most `max_nodes` of those nodes, and induce the graph on them.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::{traversal, Graph};

/// Query sampling parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySampling {
    /// Neighborhood radius around the anchor (default: 4)
    pub hops: usize,
    /// Upper bound on query size (default: 80)
    pub max_nodes: usize,
}

impl Default for QuerySampling {
    fn default() -> Self {
        Self {
            hops: 4,
            max_nodes: 80,
        }
    }
}

/// A sampled query together with where it came from.
#[derive(Debug, Clone)]
pub struct SampledQuery {
    pub graph: Graph,
    /// Anchor node id in the source graph.
    pub anchor: usize,
    /// Source-graph id of each query node, ascending.
    pub source_nodes: Vec<usize>,
}

/// Draw one query from `source`.
///
/// Fails with `MalformedGraph` on an empty source graph. The result is an
/// induced subgraph of `source`, so it always has a match there.
pub fn sample_query<R: Rng>(source: &Graph, params: QuerySampling, rng: &mut R) -> Result<SampledQuery> {
    if source.is_empty() {
        return Err(GraphError::MalformedGraph(
            "cannot sample a query from an empty graph".into(),
        ));
    }
    let anchor = rng.gen_range(0..source.node_count());
    let mut neighborhood = traversal::bfs(&[anchor], params.hops, |node| {
        source.neighbors(node).iter().copied()
    });

    neighborhood.shuffle(rng);
    neighborhood.truncate(params.max_nodes.max(1));
    neighborhood.sort_unstable();

    let graph = source.induced_subgraph(&neighborhood)?;
    Ok(SampledQuery {
        graph,
        anchor,
        source_nodes: neighborhood,
    })
}
