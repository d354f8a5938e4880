//! # Graph Model
//!
//! The puzzle dependency graph for puzzlegraph CORE.
//!
//! All data structures use `BTreeMap` for deterministic ordering.
//! Every mutation validates first and applies second, so a rejected
//! mutation never leaves a partial change behind.

use crate::primitives::{MAX_ID_LENGTH, MAX_NAME_LENGTH};
use crate::{CompositeKey, Edge, EdgeKind, Node, NodeId, NodeKind, PuzzleError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The main Graph structure.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
/// No `HashMap` allowed.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node>,

    /// Insertion sequence number per node (tie-break for ordering queries).
    sequence: BTreeMap<NodeId, u64>,

    /// Reverse of `sequence`: insertion order -> NodeId
    order: BTreeMap<u64, NodeId>,

    /// Adjacency list: source -> (target -> kind)
    successors: BTreeMap<NodeId, BTreeMap<NodeId, EdgeKind>>,

    /// Reverse adjacency: target -> sources
    predecessors: BTreeMap<NodeId, BTreeSet<NodeId>>,

    /// Composite keys: key -> parts
    composites: BTreeMap<NodeId, BTreeSet<NodeId>>,

    /// Next insertion sequence number
    next_seq: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    /// Add a node.
    ///
    /// Fails with `DuplicateId` if the identifier is already present.
    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        kind: NodeKind,
        name: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), PuzzleError> {
        let mut node = Node::new(id, kind, name);
        node.metadata = metadata;
        self.insert_node(node)
    }

    /// Add a fully built node.
    pub fn insert_node(&mut self, node: Node) -> Result<(), PuzzleError> {
        validate_node(&node)?;
        if self.nodes.contains_key(&node.id) {
            tracing::debug!(id = %node.id, "rejected duplicate node");
            return Err(PuzzleError::DuplicateId(node.id));
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);

        tracing::debug!(id = %node.id, kind = %node.kind, "node added");
        self.sequence.insert(node.id.clone(), seq);
        self.order.insert(seq, node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node together with every edge touching it.
    ///
    /// A composite declared on the node is dropped. The node is also removed
    /// from other composites' part sets; a composite left with no parts
    /// reverts to a simple key.
    pub fn remove_node(&mut self, id: &str) -> Result<Node, PuzzleError> {
        let (id, node) = self
            .nodes
            .remove_entry(id)
            .ok_or_else(|| PuzzleError::NodeNotFound(NodeId::new(id)))?;

        if let Some(seq) = self.sequence.remove(&id) {
            self.order.remove(&seq);
        }

        if let Some(targets) = self.successors.remove(&id) {
            for target in targets.keys() {
                if let Some(sources) = self.predecessors.get_mut(target) {
                    sources.remove(&id);
                    if sources.is_empty() {
                        self.predecessors.remove(target);
                    }
                }
            }
        }
        if let Some(sources) = self.predecessors.remove(&id) {
            for source in &sources {
                if let Some(targets) = self.successors.get_mut(source) {
                    targets.remove(&id);
                    if targets.is_empty() {
                        self.successors.remove(source);
                    }
                }
            }
        }

        self.composites.remove(&id);
        self.composites.retain(|_, parts| {
            parts.remove(&id);
            !parts.is_empty()
        });

        tracing::debug!(id = %id, "node removed");
        Ok(node)
    }

    /// Replace or insert one metadata entry on a node.
    ///
    /// Returns the previous value, if any.
    pub fn set_metadata(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, PuzzleError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| PuzzleError::NodeNotFound(NodeId::new(id)))?;
        Ok(node.metadata.insert(key.into(), value.into()))
    }

    // -------------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------------

    /// Add a dependency edge: `source` must be resolved before `target`.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<(), PuzzleError> {
        self.add_edge_with_kind(source, target, EdgeKind::Dependency)
    }

    /// Add an edge of the given kind.
    ///
    /// Returns an error if:
    /// - Either endpoint doesn't exist (`NodeNotFound`)
    /// - `target` already reaches `source`, self-loops included (`Cycle`)
    /// - The pair is already joined by an edge of another kind (`ConflictingEdge`)
    ///
    /// Re-adding an identical edge is a no-op.
    pub fn add_edge_with_kind(
        &mut self,
        source: &str,
        target: &str,
        kind: EdgeKind,
    ) -> Result<(), PuzzleError> {
        let source = self.existing_id(source)?;
        let target = self.existing_id(target)?;

        if let Some(existing) = self.edge_kind(&source, &target) {
            if existing == kind {
                return Ok(());
            }
            return Err(PuzzleError::ConflictingEdge {
                from: source,
                to: target,
                existing,
            });
        }

        if self.reaches(&target, &source) {
            tracing::debug!(source = %source, target = %target, "rejected cyclic edge");
            return Err(PuzzleError::Cycle {
                from: source,
                to: target,
            });
        }

        tracing::debug!(source = %source, target = %target, kind = %kind, "edge added");
        self.link(source, target, kind);
        Ok(())
    }

    /// Remove an edge. Returns the kind it had.
    pub fn remove_edge(&mut self, source: &str, target: &str) -> Result<EdgeKind, PuzzleError> {
        let kind = self
            .successors
            .get_mut(source)
            .and_then(|targets| targets.remove(target))
            .ok_or_else(|| PuzzleError::EdgeNotFound(NodeId::new(source), NodeId::new(target)))?;

        if self.successors.get(source).is_some_and(BTreeMap::is_empty) {
            self.successors.remove(source);
        }
        if let Some(sources) = self.predecessors.get_mut(target) {
            sources.remove(source);
            if sources.is_empty() {
                self.predecessors.remove(target);
            }
        }

        tracing::debug!(source, target, "edge removed");
        Ok(kind)
    }

    // -------------------------------------------------------------------------
    // Composite keys
    // -------------------------------------------------------------------------

    /// Declare that `key` is satisfied only when all `parts` are held.
    ///
    /// Each part becomes a requirement of `key`, so a part that `key`
    /// already reaches (through edges or other composites) is rejected
    /// with `Cycle`. Replaces any earlier declaration for `key`.
    pub fn declare_composite<I, P>(&mut self, key: &str, parts: I) -> Result<(), PuzzleError>
    where
        I: IntoIterator<Item = P>,
        P: Into<NodeId>,
    {
        let (key, resolved) = self.checked_composite(key, parts)?;
        if let Some(part) = resolved.iter().find(|part| self.reaches(&key, part)) {
            tracing::debug!(key = %key, part = %part, "rejected cyclic composite");
            return Err(PuzzleError::Cycle {
                from: part.clone(),
                to: key,
            });
        }

        tracing::debug!(key = %key, parts = resolved.len(), "composite key declared");
        self.composites.insert(key, resolved);
        Ok(())
    }

    /// Drop the composite declaration on `key`, returning its former parts.
    pub fn remove_composite(&mut self, key: &str) -> Result<Option<BTreeSet<NodeId>>, PuzzleError> {
        let key = self.existing_id(key)?;
        Ok(self.composites.remove(&key))
    }

    /// Get the declared parts of a composite key, if it is one.
    #[must_use]
    pub fn composite_parts(&self, key: &str) -> Option<&BTreeSet<NodeId>> {
        self.composites.get(key)
    }

    /// Iterate composite declarations in key order.
    pub fn composites(&self) -> impl Iterator<Item = (&NodeId, &BTreeSet<NodeId>)> {
        self.composites.iter()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Lookup a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check if the graph contains a node.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Check if the graph contains an edge.
    #[must_use]
    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edge_kind(source, target).is_some()
    }

    /// Get the kind of an edge.
    #[must_use]
    pub fn edge_kind(&self, source: &str, target: &str) -> Option<EdgeKind> {
        self.successors.get(source)?.get(target).copied()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.values().filter_map(|id| self.nodes.get(id))
    }

    /// All edges, ordered by (source, target).
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.successors.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |(target, kind)| Edge::new(source.clone(), target.clone(), *kind))
        })
    }

    /// Direct successors of a node with their edge kinds.
    pub fn successors<'a>(
        &'a self,
        id: &str,
    ) -> impl Iterator<Item = (&'a NodeId, EdgeKind)> + use<'a> {
        self.successors
            .get(id)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(t, k)| (t, *k)))
    }

    /// Direct predecessors of a node.
    pub fn predecessors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a NodeId> + use<'a> {
        self.predecessors.get(id).into_iter().flatten()
    }

    /// Everything that must be resolved before `id`: direct predecessors
    /// plus, for a composite key, its parts.
    #[must_use]
    pub fn requirements<'a>(&'a self, id: &str) -> BTreeSet<&'a NodeId> {
        let mut required: BTreeSet<&NodeId> = self.predecessors(id).collect();
        if let Some(parts) = self.composites.get(id) {
            required.extend(parts);
        }
        required
    }

    /// Everything that lists `id` as a requirement: direct successors plus
    /// the composite keys it is a part of.
    #[must_use]
    pub fn dependents<'a>(&'a self, id: &str) -> BTreeSet<&'a NodeId> {
        let mut dependents: BTreeSet<&NodeId> = self.successors(id).map(|(t, _)| t).collect();
        dependents.extend(
            self.composites
                .iter()
                .filter(|(_, parts)| parts.contains(id))
                .map(|(key, _)| key),
        );
        dependents
    }

    /// Number of direct predecessors.
    #[must_use]
    pub fn in_degree(&self, id: &str) -> usize {
        self.predecessors.get(id).map_or(0, BTreeSet::len)
    }

    /// Number of direct successors.
    #[must_use]
    pub fn out_degree(&self, id: &str) -> usize {
        self.successors.get(id).map_or(0, BTreeMap::len)
    }

    /// Insertion sequence number of a node.
    #[must_use]
    pub fn sequence_of(&self, id: &str) -> Option<u64> {
        self.sequence.get(id).copied()
    }

    /// Get the total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.successors.values().map(BTreeMap::len).sum()
    }

    /// Check if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn existing_id(&self, id: &str) -> Result<NodeId, PuzzleError> {
        self.nodes
            .get_key_value(id)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| PuzzleError::NodeNotFound(NodeId::new(id)))
    }

    fn existing_key(&self, id: &str) -> Result<NodeId, PuzzleError> {
        match self.nodes.get(id) {
            Some(node) if node.is_key() => Ok(node.id.clone()),
            Some(node) => Err(PuzzleError::NotAKey(node.id.clone())),
            None => Err(PuzzleError::NodeNotFound(NodeId::new(id))),
        }
    }

    /// Validate a composite declaration without storing it.
    fn checked_composite<I, P>(
        &self,
        key: &str,
        parts: I,
    ) -> Result<(NodeId, BTreeSet<NodeId>), PuzzleError>
    where
        I: IntoIterator<Item = P>,
        P: Into<NodeId>,
    {
        let key = self.existing_key(key)?;
        let mut resolved = BTreeSet::new();
        for part in parts {
            let part: NodeId = part.into();
            let part = self.existing_key(&part)?;
            if part == key {
                return Err(PuzzleError::InvalidComposite {
                    key,
                    reason: "a key cannot be one of its own parts".to_string(),
                });
            }
            resolved.insert(part);
        }
        if resolved.is_empty() {
            return Err(PuzzleError::InvalidComposite {
                key,
                reason: "part set is empty".to_string(),
            });
        }
        Ok((key, resolved))
    }

    /// Record an edge without any validation.
    fn link(&mut self, source: NodeId, target: NodeId, kind: EdgeKind) {
        self.predecessors
            .entry(target.clone())
            .or_default()
            .insert(source.clone());
        self.successors.entry(source).or_default().insert(target, kind);
    }

    /// Iterative DFS over edges and composite parts: does `from` reach `to`
    /// (a node reaches itself)?
    fn reaches(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for next in self.dependents(current) {
                if next.as_str() == to {
                    return true;
                }
                if !visited.contains(next.as_str()) {
                    stack.push(next.as_str());
                }
            }
        }
        false
    }
}

fn validate_node(node: &Node) -> Result<(), PuzzleError> {
    if node.id.is_empty() {
        return Err(PuzzleError::InvalidNode("id must not be empty".to_string()));
    }
    if node.id.len() > MAX_ID_LENGTH {
        return Err(PuzzleError::InvalidNode(format!(
            "id length {} exceeds maximum {}",
            node.id.len(),
            MAX_ID_LENGTH
        )));
    }
    if node.name.len() > MAX_NAME_LENGTH {
        return Err(PuzzleError::InvalidNode(format!(
            "name length {} exceeds maximum {}",
            node.name.len(),
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Lossless snapshot of a graph: nodes in insertion order, edges, composites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub composites: Vec<CompositeKey>,
}

impl From<&Graph> for GraphSnapshot {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().collect(),
            composites: graph
                .composites()
                .map(|(key, parts)| CompositeKey {
                    key: key.clone(),
                    parts: parts.iter().cloned().collect(),
                })
                .collect(),
        }
    }
}

impl TryFrom<GraphSnapshot> for Graph {
    type Error = PuzzleError;

    /// Bulk-load a snapshot.
    ///
    /// Edges and composites are linked without per-item cycle checks; the
    /// whole graph is verified with `is_acyclic` once everything is in place.
    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let mut graph = Graph::new();

        for node in snapshot.nodes {
            graph.insert_node(node)?;
        }

        for edge in snapshot.edges {
            let source = graph.existing_id(&edge.source)?;
            let target = graph.existing_id(&edge.target)?;
            if let Some(existing) = graph.edge_kind(&source, &target) {
                if existing != edge.kind {
                    return Err(PuzzleError::ConflictingEdge {
                        from: source,
                        to: target,
                        existing,
                    });
                }
                continue;
            }
            graph.link(source, target, edge.kind);
        }

        for composite in snapshot.composites {
            let (key, parts) = graph.checked_composite(&composite.key, composite.parts)?;
            graph.composites.insert(key, parts);
        }

        if !graph.is_acyclic() {
            tracing::warn!("bulk-loaded snapshot contains a cycle");
            return Err(PuzzleError::CyclicGraph);
        }

        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================
