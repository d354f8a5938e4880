//! # Core Type Definitions
//!
//! This module contains all core types for the puzzle dependency graph:
//! - Node identifiers and kinds (`NodeId`, `NodeKind`)
//! - Graph elements (`Node`, `Edge`, `EdgeKind`, `CompositeKey`)
//! - Error types (`PuzzleError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Carry metadata in `BTreeMap` so iteration order never depends on hashing

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// NODE IDENTIFIER
// =============================================================================

/// Unique identifier for a node within a graph.
///
/// Identifiers are caller-chosen strings such as `"room1"` or `"key_red"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// NODE KIND
// =============================================================================

/// The puzzle-domain role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Something solved by supplying a correct answer (riddle, cipher, jigsaw).
    Puzzle,
    /// A mechanism opened by a key.
    Lock,
    /// An item or piece of information that opens a lock.
    Key,
    /// An area or container gated by one or more dependencies.
    LockedSpace,
}

impl NodeKind {
    /// All kinds, in declaration order.
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Puzzle,
        NodeKind::Lock,
        NodeKind::Key,
        NodeKind::LockedSpace,
    ];

    /// Get the canonical lowercase name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Puzzle => "puzzle",
            NodeKind::Lock => "lock",
            NodeKind::Key => "key",
            NodeKind::LockedSpace => "locked_space",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeKind {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "puzzle" => Ok(NodeKind::Puzzle),
            "lock" => Ok(NodeKind::Lock),
            "key" => Ok(NodeKind::Key),
            "locked_space" | "lockedspace" => Ok(NodeKind::LockedSpace),
            _ => Err(PuzzleError::InvalidNode(format!("unknown node kind '{}'", s))),
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// A Node in the graph, representing a puzzle-domain entity.
///
/// Story or narrative details belong in `metadata`, not in new kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the owning graph.
    pub id: NodeId,
    /// The role this node plays.
    pub kind: NodeKind,
    /// Human-readable display name.
    pub name: String,
    /// Free-form key/value annotations.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    /// Create a new node with no metadata.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata entry (builder style).
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check if this node is a key.
    #[must_use]
    pub fn is_key(&self) -> bool {
        self.kind == NodeKind::Key
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// The semantic of a directed edge.
///
/// Both kinds mean "source must be resolved before target is accessible";
/// they share one edge set and one acyclicity invariant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Plain ordering: solving the source unlocks or reveals the target.
    #[default]
    Dependency,
    /// The target sits inside the source space.
    Containment,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Dependency => f.write_str("dependency"),
            EdgeKind::Containment => f.write_str("containment"),
        }
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Node that must be resolved first.
    pub source: NodeId,
    /// Node that becomes accessible afterwards.
    pub target: NodeId,
    /// Edge semantic.
    #[serde(default)]
    pub kind: EdgeKind,
}

impl Edge {
    /// Create a new edge.
    #[must_use]
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

/// A composite key declaration: `key` is held only when every part is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeKey {
    /// The composite Key node.
    pub key: NodeId,
    /// The Key nodes that make it up.
    pub parts: Vec<NodeId>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in puzzlegraph.
///
/// - No silent failures
/// - Use `Result<T, PuzzleError>` for fallible operations
/// - A failed mutation leaves the graph exactly as it was
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    /// A node with this identifier already exists.
    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),

    /// The requested node was not found in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The requested edge was not found in the graph.
    #[error("Edge not found: {0} -> {1}")]
    EdgeNotFound(NodeId, NodeId),

    /// Adding the edge would close a cycle.
    #[error("Edge {from} -> {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },

    /// The graph as a whole is not acyclic.
    #[error("Graph contains a cycle")]
    CyclicGraph,

    /// The node exists but is not a Key.
    #[error("Node {0} is not a key")]
    NotAKey(NodeId),

    /// A composite key declaration is malformed.
    #[error("Invalid composite key {key}: {reason}")]
    InvalidComposite { key: NodeId, reason: String },

    /// The edge already exists with a different kind.
    #[error("Edge {from} -> {to} already exists as {existing}")]
    ConflictingEdge {
        from: NodeId,
        to: NodeId,
        existing: EdgeKind,
    },

    /// Node identifier, name, or kind failed validation.
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// The node cannot be resolved yet.
    #[error("Node {id} is locked; unresolved: {}", join_ids(.missing))]
    Locked { id: NodeId, missing: Vec<NodeId> },

    /// The attempt does not solve the puzzle.
    #[error("Wrong answer for {id}: {attempt}")]
    WrongAnswer { id: NodeId, attempt: String },

    /// A blueprint could not be parsed or exceeds limits.
    #[error("Invalid blueprint: {0}")]
    InvalidBlueprint(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl PuzzleError {
    /// True for `NodeNotFound` and `EdgeNotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NodeNotFound(_) | Self::EdgeNotFound(..))
    }

    /// True for `Cycle` and `CyclicGraph`.
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. } | Self::CyclicGraph)
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter().map(NodeId::as_str).collect::<Vec<_>>().join(", ")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_borrows_as_str() {
        let mut map = BTreeMap::new();
        map.insert(NodeId::new("room1"), 1);
        assert_eq!(map.get("room1"), Some(&1));
    }

    #[test]
    fn node_kind_parses_loosely() {
        assert_eq!("LockedSpace".parse::<NodeKind>(), Ok(NodeKind::LockedSpace));
        assert_eq!("locked-space".parse::<NodeKind>(), Ok(NodeKind::LockedSpace));
        assert_eq!(" Key ".parse::<NodeKind>(), Ok(NodeKind::Key));
        assert!("door".parse::<NodeKind>().is_err());
    }

    #[test]
    fn node_kind_name_roundtrips_through_from_str() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.name().parse::<NodeKind>(), Ok(kind));
        }
    }

    #[test]
    fn edge_kind_defaults_to_dependency() {
        assert_eq!(EdgeKind::default(), EdgeKind::Dependency);
    }

    #[test]
    fn node_builder_collects_metadata() {
        let node = Node::new("riddle", NodeKind::Puzzle, "Clock riddle")
            .with_metadata("answer", "clock")
            .with_metadata("prompt", "I have two hands");

        assert_eq!(node.metadata.len(), 2);
        assert_eq!(node.metadata.get("answer").map(String::as_str), Some("clock"));
        assert!(!node.is_key());
    }

    #[test]
    fn locked_error_lists_missing_ids() {
        let err = PuzzleError::Locked {
            id: NodeId::new("exit"),
            missing: vec![NodeId::new("key_a"), NodeId::new("key_b")],
        };
        assert_eq!(err.to_string(), "Node exit is locked; unresolved: key_a, key_b");
    }

    #[test]
    fn wrong_answer_names_the_attempt() {
        let err = PuzzleError::WrongAnswer {
            id: NodeId::new("riddle"),
            attempt: "baby".to_string(),
        };
        assert_eq!(err.to_string(), "Wrong answer for riddle: baby");
    }

    #[test]
    fn error_classification() {
        assert!(PuzzleError::NodeNotFound(NodeId::new("x")).is_not_found());
        assert!(PuzzleError::EdgeNotFound(NodeId::new("a"), NodeId::new("b")).is_not_found());
        assert!(PuzzleError::CyclicGraph.is_cycle());
        assert!(!PuzzleError::DuplicateId(NodeId::new("x")).is_cycle());
    }
}
