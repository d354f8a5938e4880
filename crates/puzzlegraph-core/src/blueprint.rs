//! # Blueprint Module
//!
//! Declarative room descriptions, read from JSON or TOML.
//!
//! - Validate size limits before touching a graph
//! - Build through the checked mutation path (`insert_node`,
//!   `add_edge_with_kind`, `declare_composite`), so the first violation
//!   is what the caller sees
//! - No inference: a blueprint says exactly which nodes and edges exist

use crate::primitives::{MAX_BLUEPRINT_EDGES, MAX_BLUEPRINT_NODES};
use crate::{CompositeKey, Edge, Graph, Node, PuzzleError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text encodings a blueprint can be read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintFormat {
    Json,
    Toml,
}

impl FromStr for BlueprintFormat {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(PuzzleError::InvalidBlueprint(format!(
                "unknown format '{}'. Use: json, toml",
                other
            ))),
        }
    }
}

impl fmt::Display for BlueprintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Toml => f.write_str("toml"),
        }
    }
}

/// A declarative description of a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Optional title of the room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub composites: Vec<CompositeKey>,
}

impl Blueprint {
    /// Parse a blueprint from text.
    pub fn parse(text: &str, format: BlueprintFormat) -> Result<Self, PuzzleError> {
        let blueprint: Self = match format {
            BlueprintFormat::Json => serde_json::from_str(text)
                .map_err(|e| PuzzleError::InvalidBlueprint(e.to_string()))?,
            BlueprintFormat::Toml => {
                toml::from_str(text).map_err(|e| PuzzleError::InvalidBlueprint(e.to_string()))?
            }
        };
        blueprint.validate()?;
        Ok(blueprint)
    }

    /// Render the blueprint as text.
    pub fn render(&self, format: BlueprintFormat) -> Result<String, PuzzleError> {
        match format {
            BlueprintFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| PuzzleError::SerializationError(e.to_string())),
            BlueprintFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| PuzzleError::SerializationError(e.to_string())),
        }
    }

    /// Check size limits.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        if self.nodes.len() > MAX_BLUEPRINT_NODES {
            return Err(PuzzleError::InvalidBlueprint(format!(
                "node count {} exceeds maximum {}",
                self.nodes.len(),
                MAX_BLUEPRINT_NODES
            )));
        }
        if self.edges.len() > MAX_BLUEPRINT_EDGES {
            return Err(PuzzleError::InvalidBlueprint(format!(
                "edge count {} exceeds maximum {}",
                self.edges.len(),
                MAX_BLUEPRINT_EDGES
            )));
        }
        Ok(())
    }

    /// Build a graph, replaying every declaration through the checked API.
    pub fn build(&self) -> Result<Graph, PuzzleError> {
        self.validate()?;

        let mut graph = Graph::new();
        for node in &self.nodes {
            graph.insert_node(node.clone())?;
        }
        for edge in &self.edges {
            graph.add_edge_with_kind(&edge.source, &edge.target, edge.kind)?;
        }
        for composite in &self.composites {
            graph.declare_composite(&composite.key, composite.parts.iter().cloned())?;
        }

        tracing::info!(
            name = self.name.as_deref().unwrap_or("<unnamed>"),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "blueprint built"
        );
        Ok(graph)
    }

    /// Describe an existing graph as a blueprint.
    #[must_use]
    pub fn from_graph(graph: &Graph, name: Option<String>) -> Self {
        let snapshot = crate::GraphSnapshot::from(graph);
        Self {
            name,
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            composites: snapshot.composites,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
