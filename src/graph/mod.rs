//! Graph model shared by every pipeline stage.
//!
//! A `Graph` owns a validated, undirected, simple adjacency structure over
//! contiguous node ids `0..n`, plus optional per-node features and labels.
//! Construction is the only place where structure is checked; after that
//! every edge endpoint is a valid node id for the graph's lifetime.

pub mod traversal;

use crate::error::{GraphError, Result};

/// Undirected attributed graph with contiguous node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Sorted, de-duplicated neighbor lists. Never contains self-loops.
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
    /// Row-major `n x feature_dim` matrix. Empty when `feature_dim == 0`.
    features: Vec<f32>,
    feature_dim: usize,
    labels: Option<Vec<u32>>,
}

impl Graph {
    /// Build a graph from an edge list.
    ///
    /// Duplicate edges (in either direction) collapse into one and
    /// self-loops are dropped. Any endpoint `>= num_nodes` is rejected.
    pub fn new<I>(num_nodes: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
        for (u, v) in edges {
            if u >= num_nodes || v >= num_nodes {
                return Err(GraphError::MalformedGraph(format!(
                    "edge ({}, {}) references a node outside 0..{}",
                    u, v, num_nodes
                )));
            }
            if u == v {
                continue;
            }
            adjacency[u].push(v);
            adjacency[v].push(u);
        }

        let mut degree_sum = 0;
        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
            degree_sum += list.len();
        }

        Ok(Self {
            adjacency,
            edge_count: degree_sum / 2,
            features: Vec::new(),
            feature_dim: 0,
            labels: None,
        })
    }

    /// Graph with `num_nodes` isolated nodes.
    pub fn empty(num_nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); num_nodes],
            edge_count: 0,
            features: Vec::new(),
            feature_dim: 0,
            labels: None,
        }
    }

    /// Attach one feature row per node. All rows must share one width.
    pub fn with_features(self, rows: Vec<Vec<f32>>) -> Result<Self> {
        if rows.len() != self.node_count() {
            return Err(GraphError::MalformedGraph(format!(
                "{} feature rows for {} nodes",
                rows.len(),
                self.node_count()
            )));
        }
        let width = rows.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(width * rows.len());
        for (node, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(GraphError::MalformedGraph(format!(
                    "feature row {} has width {}, expected {}",
                    node,
                    row.len(),
                    width
                )));
            }
            flat.extend(row);
        }
        self.with_feature_matrix(width, flat)
    }

    /// Attach a row-major feature matrix of the given width.
    pub fn with_feature_matrix(mut self, width: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * self.node_count() {
            return Err(GraphError::MalformedGraph(format!(
                "feature matrix has {} values, expected {} x {}",
                data.len(),
                self.node_count(),
                width
            )));
        }
        self.feature_dim = width;
        self.features = data;
        Ok(self)
    }

    /// Attach one integer label per node (used by label-aware matching).
    pub fn with_labels(mut self, labels: Vec<u32>) -> Result<Self> {
        if labels.len() != self.node_count() {
            return Err(GraphError::MalformedGraph(format!(
                "{} labels for {} nodes",
                labels.len(),
                self.node_count()
            )));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Sorted neighbors of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a node of this graph.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        u < self.adjacency.len() && self.adjacency[u].binary_search(&v).is_ok()
    }

    /// Each undirected edge once, as `(u, v)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, list)| {
            list.iter().copied().filter(move |&v| u < v).map(move |v| (u, v))
        })
    }

    /// Feature width; 0 when the graph carries no features.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    pub fn features(&self, node: usize) -> Option<&[f32]> {
        if self.feature_dim == 0 || node >= self.node_count() {
            return None;
        }
        let start = node * self.feature_dim;
        Some(&self.features[start..start + self.feature_dim])
    }

    pub fn labels(&self) -> Option<&[u32]> {
        self.labels.as_deref()
    }

    /// Induce the graph on `nodes`.
    ///
    /// Node `nodes[i]` becomes node `i` of the result. Edges with both
    /// endpoints in the subset are kept; features and labels follow their
    /// nodes. Out-of-range or repeated ids are rejected.
    pub fn induced_subgraph(&self, nodes: &[usize]) -> Result<Graph> {
        let n = self.node_count();
        let mut local: Vec<Option<usize>> = vec![None; n];
        for (i, &node) in nodes.iter().enumerate() {
            if node >= n {
                return Err(GraphError::MalformedGraph(format!(
                    "subset node {} outside 0..{}",
                    node, n
                )));
            }
            if local[node].is_some() {
                return Err(GraphError::MalformedGraph(format!(
                    "subset node {} listed twice",
                    node
                )));
            }
            local[node] = Some(i);
        }

        let mut adjacency = Vec::with_capacity(nodes.len());
        let mut degree_sum = 0;
        for &node in nodes {
            let mut list: Vec<usize> = self.adjacency[node]
                .iter()
                .filter_map(|&nbr| local[nbr])
                .collect();
            list.sort_unstable();
            degree_sum += list.len();
            adjacency.push(list);
        }

        let mut features = Vec::with_capacity(nodes.len() * self.feature_dim);
        if self.feature_dim > 0 {
            for &node in nodes {
                let start = node * self.feature_dim;
                features.extend_from_slice(&self.features[start..start + self.feature_dim]);
            }
        }

        let labels = self
            .labels
            .as_ref()
            .map(|all| nodes.iter().map(|&node| all[node]).collect());

        Ok(Graph {
            adjacency,
            edge_count: degree_sum / 2,
            features,
            feature_dim: self.feature_dim,
            labels,
        })
    }

    /// Number of edges whose endpoints sit in different parts.
    ///
    /// `assignment[node]` is the part of `node`; it must cover every node.
    pub fn edge_cut(&self, assignment: &[usize]) -> usize {
        self.edges()
            .filter(|&(u, v)| assignment[u] != assignment[v])
            .count()
    }
}

/// One shard of the dataset graph: the induced subgraph over an assigned
/// node subset, plus the ids those nodes had in the dataset.
#[derive(Debug, Clone)]
pub struct Partition {
    id: usize,
    graph: Graph,
    source_nodes: Vec<usize>,
}

impl Partition {
    pub fn new(id: usize, graph: Graph, source_nodes: Vec<usize>) -> Self {
        debug_assert_eq!(graph.node_count(), source_nodes.len());
        Self {
            id,
            graph,
            source_nodes,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Dataset node id for each local node, ascending.
    pub fn source_nodes(&self) -> &[usize] {
        &self.source_nodes
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
