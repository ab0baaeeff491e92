//! Weighted directed graph over the contiguous vertex range `0..n`.
//!
//! Vertices carry no payload: a vertex *is* its index. Each vertex owns the
//! list of its outgoing edges in insertion order, and every algorithm in this
//! crate iterates edges in that order, which is what makes their outputs
//! deterministic.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// A directed edge `from → to` carrying a real-valued weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
}

/// A directed graph with weighted edges and a fixed vertex count.
///
/// Invariant: every stored edge has both endpoints in `[0, vertex_count)`,
/// and an edge stored in `adjacency[v]` has `from == v`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    adjacency: Vec<Vec<Edge>>,
    edge_count: usize,
}

impl Graph {
    /// Create a graph with `vertex_count` isolated vertices.
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); vertex_count],
            edge_count: 0,
        }
    }

    /// Create a graph from an untrusted (possibly negative) vertex count.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidArgument`] if `vertex_count` is negative
    /// or does not fit in `usize`.
    pub fn try_new(vertex_count: i64) -> Result<Self, GraphError> {
        let n = usize::try_from(vertex_count).map_err(|_| {
            GraphError::InvalidArgument(format!(
                "vertex count must be non-negative, got {vertex_count}"
            ))
        })?;
        Ok(Self::new(n))
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Append the edge `from → to` with the given weight.
    ///
    /// # Errors
    ///
    /// - [`GraphError::OutOfRange`] if either endpoint is outside `[0, n)`.
    /// - [`GraphError::InvalidArgument`] if `weight` is NaN or infinite.
    pub fn add_edge(&mut self, from: usize, to: usize, weight: f64) -> Result<(), GraphError> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        if !weight.is_finite() {
            return Err(GraphError::InvalidArgument(format!(
                "edge {from} -> {to} has non-finite weight {weight}"
            )));
        }
        self.adjacency[from].push(Edge { from, to, weight });
        self.edge_count += 1;
        Ok(())
    }

    /// Outgoing edges of `vertex`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::OutOfRange`] if `vertex` is outside `[0, n)`.
    pub fn edges_from(&self, vertex: usize) -> Result<&[Edge], GraphError> {
        self.adjacency
            .get(vertex)
            .map(Vec::as_slice)
            .ok_or_else(|| GraphError::out_of_range(vertex, self.vertex_count()))
    }

    /// Every edge, grouped by source vertex in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacency.iter().flatten()
    }

    /// In-degree of every vertex, counting parallel edges separately.
    #[must_use]
    pub fn in_degrees(&self) -> Vec<usize> {
        let mut indegree = vec![0; self.vertex_count()];
        for edge in self.edges() {
            indegree[edge.to] += 1;
        }
        indegree
    }

    /// Outgoing edges of a vertex already known to be in range.
    pub(crate) fn out_edges(&self, vertex: usize) -> &[Edge] {
        &self.adjacency[vertex]
    }

    /// Append an edge whose endpoints and weight are already known valid.
    pub(crate) fn push_unchecked(&mut self, from: usize, to: usize, weight: f64) {
        debug_assert!(from < self.vertex_count() && to < self.vertex_count());
        self.adjacency[from].push(Edge { from, to, weight });
        self.edge_count += 1;
    }

    pub(crate) fn check_vertex(&self, vertex: usize) -> Result<(), GraphError> {
        if vertex < self.vertex_count() {
            Ok(())
        } else {
            Err(GraphError::out_of_range(vertex, self.vertex_count()))
        }
    }
}
