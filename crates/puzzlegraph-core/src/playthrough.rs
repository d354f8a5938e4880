//! # Playthrough
//!
//! Tracks a single run through a room: which nodes have been resolved
//! (puzzles solved, keys found, locks opened, spaces entered) and what can
//! be resolved next.
//!
//! The graph is borrowed, never mutated. Resolution follows the same rule
//! as [`Graph::accessible`].

use crate::{Graph, Node, NodeId, PuzzleError};
use std::collections::BTreeSet;

/// Resolution state over a borrowed graph.
#[derive(Debug, Clone)]
pub struct Playthrough<'g> {
    graph: &'g Graph,
    resolved: BTreeSet<NodeId>,
    history: Vec<NodeId>,
}

impl<'g> Playthrough<'g> {
    /// Start a playthrough with nothing resolved.
    #[must_use]
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            resolved: BTreeSet::new(),
            history: Vec::new(),
        }
    }

    /// Nodes that can be resolved right now.
    #[must_use]
    pub fn accessible(&self) -> Vec<NodeId> {
        self.graph.accessible(&self.resolved)
    }

    /// Resolve a node without checking any answer.
    ///
    /// Returns `Ok(true)` if newly resolved and `Ok(false)` if it already
    /// was. Fails with `Locked` listing what is still missing.
    pub fn resolve(&mut self, id: &str) -> Result<bool, PuzzleError> {
        let node = self.unlocked(id)?;
        if self.resolved.contains(id) {
            return Ok(false);
        }
        self.mark(node);
        Ok(true)
    }

    /// Attempt to solve a node.
    ///
    /// A node carrying an `answer` metadata entry is solved only by an
    /// attempt that starts with the answer, ignoring case; anything else
    /// fails with `WrongAnswer`. Nodes without an answer resolve as with
    /// [`Playthrough::resolve`].
    pub fn solve(&mut self, id: &str, attempt: &str) -> Result<bool, PuzzleError> {
        let node = self.unlocked(id)?;
        if self.resolved.contains(id) {
            return Ok(false);
        }

        if node
            .metadata
            .get(ANSWER_KEY)
            .is_some_and(|answer| !matches_answer(attempt, answer))
        {
            tracing::debug!(id, attempt, "wrong answer");
            return Err(PuzzleError::WrongAnswer {
                id: node.id.clone(),
                attempt: attempt.to_string(),
            });
        }

        self.mark(node);
        Ok(true)
    }

    /// Unresolved requirements of a node: predecessors and composite parts.
    pub fn missing(&self, id: &str) -> Result<Vec<NodeId>, PuzzleError> {
        if !self.graph.contains_node(id) {
            return Err(PuzzleError::NodeNotFound(NodeId::new(id)));
        }
        Ok(self
            .graph
            .requirements(id)
            .into_iter()
            .filter(|r| !self.resolved.contains(*r))
            .cloned()
            .collect())
    }

    /// Check a key against the keys resolved so far.
    pub fn is_satisfied(&self, key: &str) -> Result<bool, PuzzleError> {
        self.graph.is_satisfied(key, &self.held_keys())
    }

    /// Resolved nodes that are keys.
    #[must_use]
    pub fn held_keys(&self) -> BTreeSet<NodeId> {
        self.resolved
            .iter()
            .filter(|id| self.graph.node(id).is_some_and(|n| n.is_key()))
            .cloned()
            .collect()
    }

    /// Every resolved node.
    #[must_use]
    pub fn resolved(&self) -> &BTreeSet<NodeId> {
        &self.resolved
    }

    /// Resolved nodes in the order they were resolved.
    #[must_use]
    pub fn history(&self) -> &[NodeId] {
        &self.history
    }

    /// True once every node in the graph is resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.resolved.len() == self.graph.node_count()
    }

    /// Look up a node and fail with `Locked` unless every requirement is met.
    /// Already-resolved nodes pass.
    fn unlocked(&self, id: &str) -> Result<&'g Node, PuzzleError> {
        let node = self
            .graph
            .node(id)
            .ok_or_else(|| PuzzleError::NodeNotFound(NodeId::new(id)))?;
        if self.resolved.contains(id) {
            return Ok(node);
        }

        let missing = self.missing(id)?;
        if !missing.is_empty() {
            tracing::debug!(id, missing = missing.len(), "resolve rejected");
            return Err(PuzzleError::Locked {
                id: node.id.clone(),
                missing,
            });
        }
        Ok(node)
    }

    fn mark(&mut self, node: &Node) {
        tracing::debug!(id = %node.id, "resolved");
        self.resolved.insert(node.id.clone());
        self.history.push(node.id.clone());
    }
}

/// Metadata entry holding a puzzle's expected answer.
pub const ANSWER_KEY: &str = "answer";

fn matches_answer(attempt: &str, answer: &str) -> bool {
    attempt
        .trim()
        .to_lowercase()
        .starts_with(&answer.trim().to_lowercase())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeKind, NodeKind};
    use std::collections::BTreeMap;

    fn lair() -> Graph {
        let mut graph = Graph::new();
        for (id, kind) in [
            ("lair", NodeKind::LockedSpace),
            ("riddle", NodeKind::Puzzle),
            ("vial", NodeKind::Key),
            ("stopper", NodeKind::Key),
            ("perfume", NodeKind::Key),
            ("exit", NodeKind::Lock),
        ] {
            graph
                .add_node(id, kind, id, BTreeMap::new())
                .expect("add node");
        }
        graph
            .add_edge_with_kind("lair", "riddle", EdgeKind::Containment)
            .expect("edge");
        graph
            .add_edge_with_kind("lair", "vial", EdgeKind::Containment)
            .expect("edge");
        graph.add_edge("riddle", "stopper").expect("edge");
        graph
            .declare_composite("perfume", ["vial", "stopper"])
            .expect("declare");
        graph.add_edge("perfume", "exit").expect("edge");
        graph
    }

    #[test]
    fn locked_node_reports_missing() {
        let graph = lair();
        let mut run = Playthrough::new(&graph);

        let err = run.resolve("exit");
        assert_eq!(
            err,
            Err(PuzzleError::Locked {
                id: NodeId::new("exit"),
                missing: vec![NodeId::new("perfume")],
            })
        );
        assert!(run.resolved().is_empty());
    }

    #[test]
    fn composite_parts_gate_resolution() {
        let graph = lair();
        let mut run = Playthrough::new(&graph);
        run.resolve("lair").expect("lair");
        run.resolve("vial").expect("vial");

        let err = run.resolve("perfume");
        assert!(matches!(
            err,
            Err(PuzzleError::Locked { ref missing, .. }) if missing == &vec![NodeId::new("stopper")]
        ));
        assert_eq!(run.is_satisfied("perfume"), Ok(false));
    }

    #[test]
    fn full_run_completes() {
        let graph = lair();
        let mut run = Playthrough::new(&graph);

        while !run.is_complete() {
            let next = run.accessible();
            assert!(!next.is_empty(), "stuck with {:?}", run.resolved());
            for id in next {
                assert_eq!(run.resolve(&id), Ok(true));
            }
        }

        assert_eq!(run.history().len(), graph.node_count());
        assert_eq!(run.is_satisfied("perfume"), Ok(true));
        assert_eq!(run.held_keys().len(), 3);
    }

    #[test]
    fn resolving_twice_is_a_noop() {
        let graph = lair();
        let mut run = Playthrough::new(&graph);
        assert_eq!(run.resolve("lair"), Ok(true));
        assert_eq!(run.resolve("lair"), Ok(false));
        assert_eq!(run.history().len(), 1);
    }

    fn riddle_room() -> Graph {
        let mut graph = Graph::new();
        graph
            .add_node("lair", NodeKind::LockedSpace, "Lair", BTreeMap::new())
            .expect("add node");
        graph
            .insert_node(
                Node::new("riddle", NodeKind::Puzzle, "Simple riddle")
                    .with_metadata("prompt", "I have 2 hands but can't grasp things. What am I?")
                    .with_metadata(ANSWER_KEY, "clock"),
            )
            .expect("add node");
        graph.add_edge("lair", "riddle").expect("edge");
        graph
    }

    #[test]
    fn wrong_answer_leaves_puzzle_unsolved() {
        let graph = riddle_room();
        let mut run = Playthrough::new(&graph);
        run.resolve("lair").expect("lair");

        assert_eq!(
            run.solve("riddle", "baby"),
            Err(PuzzleError::WrongAnswer {
                id: NodeId::new("riddle"),
                attempt: "baby".to_string(),
            })
        );
        assert!(!run.resolved().contains("riddle"));
        assert_eq!(run.accessible(), vec![NodeId::new("riddle")]);
    }

    #[test]
    fn right_answer_solves_puzzle() {
        let graph = riddle_room();
        let mut run = Playthrough::new(&graph);
        run.resolve("lair").expect("lair");

        assert_eq!(run.solve("riddle", "  Clock, obviously"), Ok(true));
        assert_eq!(run.solve("riddle", "baby"), Ok(false));
        assert!(run.is_complete());
    }

    #[test]
    fn locked_puzzle_checked_before_answer() {
        let graph = riddle_room();
        let mut run = Playthrough::new(&graph);

        assert!(matches!(
            run.solve("riddle", "clock"),
            Err(PuzzleError::Locked { .. })
        ));
        assert_eq!(run.solve("lair", "anything"), Ok(true));
    }

    #[test]
    fn composite_without_edges_resolves_after_parts() {
        let mut graph = Graph::new();
        for id in ["k", "a", "b"] {
            graph
                .add_node(id, NodeKind::Key, id, BTreeMap::new())
                .expect("add node");
        }
        graph.declare_composite("k", ["a", "b"]).expect("declare");
        let mut run = Playthrough::new(&graph);

        let order: Vec<NodeId> = graph.topological_order().expect("order").cloned().collect();
        for id in &order {
            assert_eq!(run.resolve(id), Ok(true));
        }
        assert!(run.is_complete());
        assert_eq!(run.missing("k"), Ok(Vec::new()));
    }

    #[test]
    fn unknown_node_not_found() {
        let graph = lair();
        let mut run = Playthrough::new(&graph);
        assert!(run.resolve("ghost").is_err_and(|e| e.is_not_found()));
    }
}
