use std::fmt;
use thiserror::Error;

/// Which endpoint of an edge could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    Parent,
    Child,
}

impl fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSide::Parent => f.write_str("parent"),
            EdgeSide::Child => f.write_str("child"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DagError {
    #[error("vertex with key '{key}' already exists in graph")]
    VertexAlreadyExists { key: String },

    #[error("cannot add {side} '{missing}' to '{attached_to}'")]
    VertexNotFound {
        missing: String,
        attached_to: String,
        side: EdgeSide,
    },

    #[error("dependency cycle detected between: {}", .keys.join(", "))]
    CycleDetected { keys: Vec<String> },
}

pub type Result<T> = std::result::Result<T, DagError>;
