//! # puzzlegraph-core
//!
//! The puzzle dependency engine for puzzlegraph - THE LOGIC.
//!
//! Escape-room structure is modeled as a layered directed acyclic graph:
//! puzzles, locks, keys and locked spaces are typed nodes, and an edge
//! `a -> b` means "a must be resolved before b becomes accessible".
//!
//! ## Layout
//!
//! - `graph` → the Graph Model (nodes, edges, composite keys)
//! - `query` → the Query/Validation Layer (ordering, reachability, keys)
//! - `playthrough` → incremental resolution over a graph
//! - `blueprint` → JSON / TOML room descriptions
//! - `formats` → binary persistence
//! - `metrics` → structural summary
//!
//! ## Constraints
//!
//! The CORE:
//! - Is synchronous and single-threaded; embedders serialize access
//! - Is deterministic: `BTreeMap` ordering, insertion-order tie-breaks
//! - Never leaves a rejected mutation half-applied
//! - Has NO async, NO network, NO file I/O
//!
//! ```
//! use puzzlegraph_core::{Graph, NodeKind};
//! use std::collections::BTreeMap;
//!
//! let mut graph = Graph::new();
//! graph.add_node("room1", NodeKind::LockedSpace, "Room", BTreeMap::new())?;
//! graph.add_node("puzzle1", NodeKind::Puzzle, "Riddle", BTreeMap::new())?;
//! graph.add_node("key1", NodeKind::Key, "Brass key", BTreeMap::new())?;
//! graph.add_edge("puzzle1", "key1")?;
//! graph.add_edge("key1", "room1")?;
//!
//! let order: Vec<_> = graph.topological_order()?.map(|id| id.as_str()).collect();
//! assert_eq!(order, ["puzzle1", "key1", "room1"]);
//! assert!(graph.add_edge("room1", "puzzle1").is_err());
//! # Ok::<(), puzzlegraph_core::PuzzleError>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod blueprint;
pub mod formats;
pub mod graph;
pub mod metrics;
pub mod playthrough;
pub mod primitives;
pub mod query;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CompositeKey, Edge, EdgeKind, Node, NodeId, NodeKind, PuzzleError};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use blueprint::{Blueprint, BlueprintFormat};
pub use graph::{Graph, GraphSnapshot};
pub use metrics::GraphMetrics;
pub use playthrough::{ANSWER_KEY, Playthrough};
pub use query::{Query, QueryResult, QueryType, TopologicalOrder};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, graph_from_bytes, graph_to_bytes};
