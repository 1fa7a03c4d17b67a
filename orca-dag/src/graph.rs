use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::error::{DagError, EdgeSide, Result};

/// Anything that can be turned into a graph vertex.
///
/// Implementors may describe their edges from either side; both are added.
pub trait Graphable {
    fn key(&self) -> &str;

    fn children(&self) -> &[String] {
        &[]
    }

    fn parents(&self) -> &[String] {
        &[]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    key: String,
    children: BTreeSet<String>,
    parents: BTreeSet<String>,
}

impl Vertex {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            children: BTreeSet::new(),
            parents: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str)
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> {
        self.parents.iter().map(String::as_str)
    }

    pub fn has_child(&self, key: &str) -> bool {
        self.children.contains(key)
    }

    pub fn has_parent(&self, key: &str) -> bool {
        self.parents.contains(key)
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    vertices: BTreeMap<String, Vertex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from nodes, then rejects it if any dependency cycle exists.
    pub fn from_nodes<T: Graphable>(nodes: &[T]) -> Result<Self> {
        let mut graph = Self::new();

        for node in nodes {
            graph.add_vertex(node.key())?;
        }

        for node in nodes {
            for child in node.children() {
                graph.add_edge(node.key(), child)?;
            }
            for parent in node.parents() {
                graph.add_edge(parent, node.key())?;
            }
        }

        let cyclic = graph.cyclic_keys();
        if !cyclic.is_empty() {
            return Err(DagError::CycleDetected { keys: cyclic });
        }

        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, key: &str) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vertices.contains_key(key)
    }

    pub fn add_vertex(&mut self, key: &str) -> Result<()> {
        if self.contains(key) {
            return Err(DagError::VertexAlreadyExists {
                key: key.to_string(),
            });
        }

        self.vertices.insert(key.to_string(), Vertex::new(key));
        Ok(())
    }

    /// Adds a directed edge from `parent` to `child`, recording it on both
    /// vertices. Adding an existing edge again is a no-op.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<()> {
        if !self.contains(parent) {
            return Err(DagError::VertexNotFound {
                missing: parent.to_string(),
                attached_to: child.to_string(),
                side: EdgeSide::Parent,
            });
        }
        if !self.contains(child) {
            return Err(DagError::VertexNotFound {
                missing: child.to_string(),
                attached_to: parent.to_string(),
                side: EdgeSide::Child,
            });
        }

        if let Some(vertex) = self.vertices.get_mut(parent) {
            vertex.children.insert(child.to_string());
        }
        if let Some(vertex) = self.vertices.get_mut(child) {
            vertex.parents.insert(parent.to_string());
        }
        Ok(())
    }

    /// Removes a vertex and every reference other vertices hold to it.
    pub fn remove_vertex(&mut self, key: &str) -> Option<Vertex> {
        let removed = self.vertices.remove(key)?;

        for child in &removed.children {
            if let Some(vertex) = self.vertices.get_mut(child) {
                vertex.parents.remove(key);
            }
        }
        for parent in &removed.parents {
            if let Some(vertex) = self.vertices.get_mut(parent) {
                vertex.children.remove(key);
            }
        }

        Some(removed)
    }

    /// Vertices without parents, sorted by key.
    pub fn roots(&self) -> Vec<&Vertex> {
        self.vertices.values().filter(|v| v.is_root()).collect()
    }

    /// Vertices without children, sorted by key.
    pub fn leaves(&self) -> Vec<&Vertex> {
        self.vertices.values().filter(|v| v.is_leaf()).collect()
    }

    /// Keys ordered so every parent comes before its children.
    pub fn topological_keys_from_roots(&self) -> Result<Vec<String>> {
        self.peel(Vertex::is_root)
    }

    /// Keys ordered so every child comes before its parents.
    pub fn topological_keys_from_leaves(&self) -> Result<Vec<String>> {
        self.peel(Vertex::is_leaf)
    }

    /// Keys of vertices that sit on, or between, dependency cycles.
    pub fn cyclic_keys(&self) -> Vec<String> {
        let mut remaining = self.clone();

        loop {
            let removable: Vec<String> = remaining
                .vertices
                .values()
                .filter(|v| v.is_root() || v.is_leaf())
                .map(|v| v.key.clone())
                .collect();

            if removable.is_empty() {
                break;
            }
            for key in &removable {
                remaining.remove_vertex(key);
            }
        }

        remaining.vertices.into_keys().collect()
    }

    // Works on a clone so the caller's graph is never modified.
    fn peel(&self, eligible: fn(&Vertex) -> bool) -> Result<Vec<String>> {
        let mut remaining = self.clone();
        let mut sorted = Vec::with_capacity(self.len());

        while !remaining.is_empty() {
            let layer: Vec<String> = remaining
                .vertices
                .values()
                .filter(|v| eligible(v))
                .map(|v| v.key.clone())
                .collect();

            if layer.is_empty() {
                return Err(DagError::CycleDetected {
                    keys: remaining.vertices.into_keys().collect(),
                });
            }

            trace!(?layer, "peeled graph layer");
            for key in &layer {
                remaining.remove_vertex(key);
            }
            sorted.extend(layer);
        }

        Ok(sorted)
    }
}
