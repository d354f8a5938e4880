//! # Demo Room
//!
//! The perfumer's lair: enter the lair, assemble the bottle of ultimate
//! perfume, and leave before the police arrive.

use super::commands::{describe, print_json, save_graph};
use puzzlegraph_core::{
    ANSWER_KEY, EdgeKind, Graph, NodeId, NodeKind, Playthrough, PuzzleError,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One resolution in a demo playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub step: usize,
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// Attempt that solved an answer-checked puzzle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solved_with: Option<String>,
    /// Attempts refused before that.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

/// Build the perfumer's lair room graph.
pub fn perfumers_lair() -> Result<Graph, PuzzleError> {
    let mut graph = Graph::new();

    graph.add_node("lair", NodeKind::LockedSpace, "main lair", BTreeMap::new())?;
    graph.set_metadata(
        "lair",
        "story",
        "Find the priceless perfume and escape before the police arrive",
    )?;

    graph.add_node("riddle", NodeKind::Puzzle, "Simple riddle", BTreeMap::new())?;
    graph.set_metadata(
        "riddle",
        "prompt",
        "I have 2 hands but can't grasp things. What am I?",
    )?;
    graph.set_metadata("riddle", ANSWER_KEY, "clock")?;

    graph.add_node("vial", NodeKind::Key, "Empty crystal vial", BTreeMap::new())?;
    graph.add_node("stopper", NodeKind::Key, "Golden stopper", BTreeMap::new())?;
    graph.add_node(
        "perfume",
        NodeKind::Key,
        "Bottle of ultimate perfume",
        BTreeMap::new(),
    )?;
    graph.add_node(
        "exit_door",
        NodeKind::Lock,
        "the exit from Perfumer's lair",
        BTreeMap::new(),
    )?;
    graph.set_metadata("exit_door", "description", "A door that looks like an exit.")?;
    graph.add_node("outside", NodeKind::LockedSpace, "the outside world", BTreeMap::new())?;
    graph.set_metadata("outside", "contents", "Freedom into the outside world")?;

    graph.add_edge_with_kind("lair", "riddle", EdgeKind::Containment)?;
    graph.add_edge_with_kind("lair", "stopper", EdgeKind::Containment)?;
    graph.add_edge_with_kind("lair", "exit_door", EdgeKind::Containment)?;
    graph.add_edge("riddle", "vial")?;
    graph.add_edge("perfume", "exit_door")?;
    graph.add_edge("exit_door", "outside")?;
    graph.declare_composite("perfume", ["vial", "stopper"])?;

    Ok(graph)
}

/// Guesses the demo player makes at the lair's riddle, in order.
pub fn lair_attempts() -> BTreeMap<NodeId, Vec<String>> {
    BTreeMap::from([(
        NodeId::new("riddle"),
        vec!["baby".to_string(), "clock".to_string()],
    )])
}

/// Resolve the first accessible node until nothing is left.
///
/// Puzzles that check an answer are tried with their `attempts` in order;
/// the run stops with `WrongAnswer` if none of them fits. A run that ends
/// with nodes still unresolved fails with `Locked` for the first of them.
pub fn play(
    graph: &Graph,
    attempts: &BTreeMap<NodeId, Vec<String>>,
) -> Result<Vec<Step>, PuzzleError> {
    let mut run = Playthrough::new(graph);
    let mut steps = Vec::with_capacity(graph.node_count());

    while let Some(next) = run.accessible().into_iter().next() {
        let Some(node) = graph.node(&next) else {
            return Err(PuzzleError::NodeNotFound(next));
        };

        let mut step = Step {
            step: steps.len() + 1,
            id: next.clone(),
            kind: node.kind,
            name: node.name.clone(),
            solved_with: None,
            rejected: Vec::new(),
        };

        if node.metadata.contains_key(ANSWER_KEY) {
            let guesses = attempts.get(&next).map(Vec::as_slice).unwrap_or_default();
            let solved = guess_until_solved(&mut run, &next, guesses, &mut step.rejected)?;
            step.solved_with = Some(solved);
        } else {
            run.resolve(&next)?;
        }
        steps.push(step);
    }

    if let Some(stuck) = graph.nodes().find(|n| !run.resolved().contains(&n.id)) {
        tracing::warn!(
            "Playthrough stalled after {} of {} nodes",
            run.resolved().len(),
            graph.node_count()
        );
        return Err(PuzzleError::Locked {
            id: stuck.id.clone(),
            missing: run.missing(&stuck.id)?,
        });
    }

    Ok(steps)
}

fn guess_until_solved(
    run: &mut Playthrough<'_>,
    id: &NodeId,
    guesses: &[String],
    rejected: &mut Vec<String>,
) -> Result<String, PuzzleError> {
    for guess in guesses {
        match run.solve(id, guess) {
            Ok(_) => return Ok(guess.clone()),
            Err(PuzzleError::WrongAnswer { .. }) => rejected.push(guess.clone()),
            Err(e) => return Err(e),
        }
    }
    Err(PuzzleError::WrongAnswer {
        id: id.clone(),
        attempt: rejected.last().cloned().unwrap_or_default(),
    })
}

/// Build the demo room, print its order and a full playthrough.
pub fn cmd_demo(graph_path: &Path, json_mode: bool, save: bool) -> Result<(), PuzzleError> {
    let graph = perfumers_lair()?;
    let order: Vec<NodeId> = graph.topological_order()?.cloned().collect();
    let steps = play(&graph, &lair_attempts())?;

    if save {
        save_graph(&graph, graph_path)?;
    }

    if json_mode {
        let output = serde_json::json!({
            "order": order,
            "layers": graph.layers()?,
            "steps": steps,
            "complete": steps.len() == graph.node_count()
        });
        print_json(&output);
        return Ok(());
    }

    println!("The Perfumer's Lair");
    println!("===================");
    println!();
    println!("Solving order:");
    for (i, id) in order.iter().enumerate() {
        println!("{:>3}. {}", i + 1, describe(&graph, id));
    }

    println!();
    println!("Playthrough:");
    for step in &steps {
        println!("{:>3}. resolve {} ({})", step.step, step.id, step.name);
        let Some(node) = graph.node(&step.id) else {
            continue;
        };
        if let Some(prompt) = node.metadata.get("prompt") {
            println!("       \"{}\"", prompt);
        }
        for guess in &step.rejected {
            println!("       try {:?}: wrong", guess);
        }
        if let Some(guess) = &step.solved_with {
            println!("       try {:?}: correct", guess);
        }
        if let Some(contents) = node.metadata.get("contents") {
            println!("       {}", contents);
        }
    }

    if save {
        println!();
        println!("Saved demo graph to {:?}", graph_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lair_builds_and_orders() {
        let graph = perfumers_lair().expect("lair");
        let order: Vec<&str> = graph
            .topological_order()
            .expect("order")
            .map(NodeId::as_str)
            .collect();

        assert_eq!(order.first(), Some(&"lair"));
        assert_eq!(order.last(), Some(&"outside"));
        assert_eq!(graph.composite_parts("perfume").map(|p| p.len()), Some(2));
    }

    #[test]
    fn playthrough_resolves_everything() {
        let graph = perfumers_lair().expect("lair");
        let steps = play(&graph, &lair_attempts()).expect("play");
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                "lair", "riddle", "vial", "stopper", "perfume", "exit_door", "outside"
            ]
        );
    }

    #[test]
    fn riddle_replayed_with_wrong_then_right_guess() {
        let graph = perfumers_lair().expect("lair");
        let steps = play(&graph, &lair_attempts()).expect("play");

        let riddle = steps.iter().find(|s| s.id.as_str() == "riddle").expect("riddle step");
        assert_eq!(riddle.rejected, vec!["baby".to_string()]);
        assert_eq!(riddle.solved_with.as_deref(), Some("clock"));
        assert!(steps.iter().filter(|s| s.id.as_str() != "riddle").all(|s| s.solved_with.is_none()));
    }

    #[test]
    fn unsolved_riddle_stops_the_run() {
        let graph = perfumers_lair().expect("lair");
        let attempts = BTreeMap::from([(NodeId::new("riddle"), vec!["baby".to_string()])]);

        assert_eq!(
            play(&graph, &attempts).map(|steps| steps.len()),
            Err(PuzzleError::WrongAnswer {
                id: NodeId::new("riddle"),
                attempt: "baby".to_string(),
            })
        );
        assert!(matches!(
            play(&graph, &BTreeMap::new()),
            Err(PuzzleError::WrongAnswer { .. })
        ));
    }

    #[test]
    fn lair_order_matches_playthrough() {
        let graph = perfumers_lair().expect("lair");
        let order: Vec<NodeId> = graph.topological_order().expect("order").cloned().collect();
        let steps = play(&graph, &lair_attempts()).expect("play");

        assert_eq!(steps.into_iter().map(|s| s.id).collect::<Vec<_>>(), order);
    }
}
