//! Error types for the retrieval pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid partition count: k={k} for a graph with {nodes} nodes")]
    InvalidPartitionCount { k: usize, nodes: usize },

    #[error("Dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        context: String,
    },

    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    #[error("Invalid partition selector {selector}: expected a value in [0, {partitions})")]
    InvalidPartitionSelector { selector: usize, partitions: usize },

    #[error("Embedder failure: {0}")]
    EmbedderFailure(String),

    #[error("Embedding index has not been built")]
    IndexNotBuilt,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// Stable error-kind name, printed by the command-line front end.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::InvalidPartitionCount { .. } => "INVALID_PARTITION_COUNT",
            GraphError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            GraphError::MalformedGraph(_) => "MALFORMED_GRAPH",
            GraphError::InvalidPartitionSelector { .. } => "INVALID_PARTITION_SELECTOR",
            GraphError::EmbedderFailure(_) => "EMBEDDER_FAILURE",
            GraphError::IndexNotBuilt => "INDEX_NOT_BUILT",
            GraphError::InvalidConfig(_) => "INVALID_CONFIG",
            GraphError::Io(_) => "IO_ERROR",
            GraphError::Json(_) => "JSON_ERROR",
        }
    }

    pub(crate) fn dimension(expected: usize, found: usize, context: impl Into<String>) -> Self {
        GraphError::DimensionMismatch {
            expected,
            found,
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_kind() {
        let errors = [
            GraphError::InvalidPartitionCount { k: 5, nodes: 3 },
            GraphError::dimension(16, 8, "search"),
            GraphError::MalformedGraph("edge (0, 9)".into()),
            GraphError::InvalidPartitionSelector { selector: 7, partitions: 4 },
            GraphError::EmbedderFailure("model".into()),
            GraphError::IndexNotBuilt,
            GraphError::InvalidConfig("k".into()),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = GraphError::dimension(16, 8, "index entry 3");
        let msg = err.to_string();
        assert!(msg.contains("index entry 3"));
        assert!(msg.contains("16"));
        assert!(msg.contains('8'));

        let err = GraphError::InvalidPartitionSelector { selector: 7, partitions: 4 };
        assert_eq!(
            err.to_string(),
            "Invalid partition selector 7: expected a value in [0, 4)"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GraphError = io.into();
        assert_eq!(err.code(), "IO_ERROR");
    }
}
