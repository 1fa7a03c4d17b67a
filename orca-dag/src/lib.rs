//! Dependency graph over opaque string keys.
//!
//! Edges run from parent to child. Traversals are deterministic: vertices
//! that become eligible in the same pass are emitted in ascending key order.

pub mod error;
pub mod graph;

pub use error::{DagError, EdgeSide, Result};
pub use graph::{Graph, Graphable, Vertex};
