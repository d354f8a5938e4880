//! # Graph Metrics
//!
//! A structural summary of a puzzle graph. Informational only: nothing in
//! the CORE gates behavior on these numbers.

use crate::{EdgeKind, Graph, NodeKind, PuzzleError};
use serde::Serialize;

/// Structural counts for a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub puzzles: usize,
    pub locks: usize,
    pub keys: usize,
    pub locked_spaces: usize,
    pub edge_count: usize,
    pub dependency_edges: usize,
    pub containment_edges: usize,
    pub composite_keys: usize,
    pub roots: usize,
    pub leaves: usize,
    /// Number of longest-path layers (0 for an empty graph).
    pub depth: usize,
}

impl GraphMetrics {
    /// Collect metrics from a graph.
    pub fn from_graph(graph: &Graph) -> Result<Self, PuzzleError> {
        let mut metrics = Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            composite_keys: graph.composites().count(),
            roots: graph.roots().len(),
            leaves: graph.leaves().len(),
            depth: graph.layers()?.len(),
            ..Self::default()
        };

        for node in graph.nodes() {
            match node.kind {
                NodeKind::Puzzle => metrics.puzzles += 1,
                NodeKind::Lock => metrics.locks += 1,
                NodeKind::Key => metrics.keys += 1,
                NodeKind::LockedSpace => metrics.locked_spaces += 1,
            }
        }
        for edge in graph.edges() {
            match edge.kind {
                EdgeKind::Dependency => metrics.dependency_edges += 1,
                EdgeKind::Containment => metrics.containment_edges += 1,
            }
        }

        Ok(metrics)
    }
}
