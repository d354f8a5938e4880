//! # Query Module
//!
//! Read-only structural questions over a [`Graph`]:
//! - Ordering (`topological_order`, `layers`)
//! - Reachability (`reachable_from`, `prerequisites_of`)
//! - Key possession (`is_satisfied`) and progress (`accessible`)
//!
//! Plus structured query types (`Query`, `QueryType`) so callers such as
//! the CLI can dispatch a question without matching on method names.

use crate::{EdgeKind, Graph, NodeId, NodeKind, PuzzleError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// TOPOLOGICAL ORDER
// =============================================================================

/// Lazy topological walk over a graph.
///
/// Kahn's algorithm over [`Graph::requirements`] (edges plus composite
/// parts), with the ready set keyed by insertion sequence, so among nodes
/// with no ordering constraint between them the one added first wins.
#[derive(Debug, Clone)]
pub struct TopologicalOrder<'a> {
    graph: &'a Graph,
    in_degrees: BTreeMap<&'a NodeId, usize>,
    ready: BTreeMap<u64, &'a NodeId>,
    remaining: usize,
}

impl<'a> TopologicalOrder<'a> {
    fn new(graph: &'a Graph) -> Self {
        let mut in_degrees = BTreeMap::new();
        let mut ready = BTreeMap::new();

        for node in graph.nodes() {
            let degree = graph.requirements(&node.id).len();
            if degree == 0 {
                if let Some(seq) = graph.sequence_of(&node.id) {
                    ready.insert(seq, &node.id);
                }
            } else {
                in_degrees.insert(&node.id, degree);
            }
        }

        Self {
            graph,
            in_degrees,
            ready,
            remaining: graph.node_count(),
        }
    }
}

impl<'a> Iterator for TopologicalOrder<'a> {
    type Item = &'a NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph;
        let (_, current) = self.ready.pop_first()?;
        self.remaining = self.remaining.saturating_sub(1);

        for successor in graph.dependents(current) {
            if let Some(degree) = self.in_degrees.get_mut(successor) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    self.in_degrees.remove(successor);
                    if let Some(seq) = graph.sequence_of(successor) {
                        self.ready.insert(seq, successor);
                    }
                }
            }
        }

        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.ready.len(), Some(self.remaining))
    }
}

// =============================================================================
// GRAPH QUERIES
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Graph {
    /// Re-verify that edges and composite parts together are acyclic.
    ///
    /// Holds by construction for graphs built through `add_edge` and
    /// `declare_composite`; this is the check applied after bulk loads.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        TopologicalOrder::new(self).count() == self.node_count()
    }

    /// Node ids such that every requirement precedes its dependents.
    ///
    /// Fails with `CyclicGraph` if the graph is not acyclic. The returned
    /// iterator is lazy; ties are broken by insertion order.
    pub fn topological_order(&self) -> Result<TopologicalOrder<'_>, PuzzleError> {
        if !self.is_acyclic() {
            return Err(PuzzleError::CyclicGraph);
        }
        Ok(TopologicalOrder::new(self))
    }

    /// Everything solving `id` unlocks, transitively (excluding `id`).
    ///
    /// Follows edges and composite membership alike.
    pub fn reachable_from(&self, id: &str) -> Result<BTreeSet<NodeId>, PuzzleError> {
        self.walk(id, Direction::Forward)
    }

    /// Everything that must be resolved before `id` is reachable (excluding `id`).
    pub fn prerequisites_of(&self, id: &str) -> Result<BTreeSet<NodeId>, PuzzleError> {
        self.walk(id, Direction::Backward)
    }

    /// Check whether `held` satisfies a key.
    ///
    /// A composite key is satisfied iff every declared part is in `held`;
    /// a simple key iff the key itself is in `held`.
    pub fn is_satisfied(&self, key: &str, held: &BTreeSet<NodeId>) -> Result<bool, PuzzleError> {
        let node = self
            .node(key)
            .ok_or_else(|| PuzzleError::NodeNotFound(NodeId::new(key)))?;
        if !node.is_key() {
            return Err(PuzzleError::NotAKey(node.id.clone()));
        }

        Ok(match self.composite_parts(key) {
            Some(parts) => parts.iter().all(|part| held.contains(part)),
            None => held.contains(key),
        })
    }

    /// Nodes with no requirements, in insertion order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| self.requirements(&n.id).is_empty())
            .map(|n| n.id.clone())
            .collect()
    }

    /// Nodes nothing depends on, in insertion order.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| self.dependents(&n.id).is_empty())
            .map(|n| n.id.clone())
            .collect()
    }

    /// Longest-path layering.
    ///
    /// Roots are layer 0; every other node sits one layer below its deepest
    /// requirement. Nodes within a layer keep insertion order.
    pub fn layers(&self) -> Result<Vec<Vec<NodeId>>, PuzzleError> {
        let mut depth: BTreeMap<&NodeId, usize> = BTreeMap::new();
        for id in self.topological_order()? {
            let layer = self
                .requirements(id)
                .into_iter()
                .filter_map(|p| depth.get(p))
                .map(|d| d.saturating_add(1))
                .max()
                .unwrap_or(0);
            depth.insert(id, layer);
        }

        let mut layers: Vec<Vec<NodeId>> = Vec::new();
        for node in self.nodes() {
            let Some(&layer) = depth.get(&node.id) else {
                continue;
            };
            if layers.len() <= layer {
                layers.resize_with(layer.saturating_add(1), Vec::new);
            }
            layers[layer].push(node.id.clone());
        }
        Ok(layers)
    }

    /// Direct containment children of a space, in id order.
    pub fn contents_of(&self, space: &str) -> Result<Vec<NodeId>, PuzzleError> {
        if !self.contains_node(space) {
            return Err(PuzzleError::NodeNotFound(NodeId::new(space)));
        }
        Ok(self
            .successors(space)
            .filter(|(_, kind)| *kind == EdgeKind::Containment)
            .map(|(id, _)| id.clone())
            .collect())
    }

    /// Unresolved nodes that can be resolved next, in insertion order.
    ///
    /// A node is accessible when every direct predecessor is resolved and,
    /// for a composite key, every part is resolved too.
    #[must_use]
    pub fn accessible(&self, resolved: &BTreeSet<NodeId>) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| !resolved.contains(&n.id))
            .filter(|n| {
                self.requirements(&n.id)
                    .into_iter()
                    .all(|r| resolved.contains(r))
            })
            .map(|n| n.id.clone())
            .collect()
    }

    /// Nodes of one kind, in insertion order.
    #[must_use]
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.kind == kind)
            .map(|n| n.id.clone())
            .collect()
    }

    /// BFS from `start` along `direction`; excludes `start`.
    fn walk(&self, start: &str, direction: Direction) -> Result<BTreeSet<NodeId>, PuzzleError> {
        if !self.contains_node(start) {
            return Err(PuzzleError::NodeNotFound(NodeId::new(start)));
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let neighbors = match direction {
                Direction::Forward => self.dependents(current),
                Direction::Backward => self.requirements(current),
            };
            for neighbor in neighbors {
                if neighbor.as_str() != start && visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor.as_str());
                }
            }
        }

        Ok(visited)
    }
}

// =============================================================================
// STRUCTURED QUERIES
// =============================================================================

/// Query operation types supported by the CORE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryType {
    /// Full dependency order.
    TopologicalOrder,

    /// Longest-path layering.
    Layers,

    /// Forward reachability from a node.
    ReachableFrom(NodeId),

    /// Backward reachability to a node.
    PrerequisitesOf(NodeId),

    /// Key satisfaction against a held set.
    IsSatisfied { key: NodeId, held: BTreeSet<NodeId> },

    /// Next resolvable nodes given a resolved set.
    Accessible(BTreeSet<NodeId>),

    /// Containment children of a space.
    ContentsOf(NodeId),
}

/// A structured query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The type of query operation.
    pub query_type: QueryType,
}

/// The answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// An ordered list of node ids.
    Sequence(Vec<NodeId>),
    /// An unordered set of node ids (sorted for output).
    Set(BTreeSet<NodeId>),
    /// Layered node ids.
    Layers(Vec<Vec<NodeId>>),
    /// A yes/no answer.
    Bool(bool),
}

impl Query {
    /// Create a new query.
    #[must_use]
    pub fn new(query_type: QueryType) -> Self {
        Self { query_type }
    }

    /// Topological order helper.
    #[must_use]
    pub fn topological_order() -> Self {
        Self::new(QueryType::TopologicalOrder)
    }

    /// Reachability helper.
    #[must_use]
    pub fn reachable_from(id: impl Into<NodeId>) -> Self {
        Self::new(QueryType::ReachableFrom(id.into()))
    }

    /// Prerequisites helper.
    #[must_use]
    pub fn prerequisites_of(id: impl Into<NodeId>) -> Self {
        Self::new(QueryType::PrerequisitesOf(id.into()))
    }

    /// Key satisfaction helper.
    #[must_use]
    pub fn is_satisfied(key: impl Into<NodeId>, held: BTreeSet<NodeId>) -> Self {
        Self::new(QueryType::IsSatisfied {
            key: key.into(),
            held,
        })
    }

    /// Run the query against a graph.
    pub fn execute(&self, graph: &Graph) -> Result<QueryResult, PuzzleError> {
        match &self.query_type {
            QueryType::TopologicalOrder => Ok(QueryResult::Sequence(
                graph.topological_order()?.cloned().collect(),
            )),
            QueryType::Layers => Ok(QueryResult::Layers(graph.layers()?)),
            QueryType::ReachableFrom(id) => Ok(QueryResult::Set(graph.reachable_from(id)?)),
            QueryType::PrerequisitesOf(id) => Ok(QueryResult::Set(graph.prerequisites_of(id)?)),
            QueryType::IsSatisfied { key, held } => {
                Ok(QueryResult::Bool(graph.is_satisfied(key, held)?))
            }
            QueryType::Accessible(resolved) => {
                Ok(QueryResult::Sequence(graph.accessible(resolved)))
            }
            QueryType::ContentsOf(space) => Ok(QueryResult::Sequence(graph.contents_of(space)?)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
