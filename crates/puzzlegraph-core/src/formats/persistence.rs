//! # Persistence Format
//!
//! Binary serialization for puzzle graphs.
//!
//! Format: Header (5 bytes) + postcard-serialized [`GraphSnapshot`].
//! - 4 bytes: Magic ("PZGR")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded. Decoding
//! goes through `Graph::try_from`, which re-checks endpoints and runs
//! `is_acyclic` on the loaded edge set.

use crate::primitives::{self, HEADER_SIZE, MAX_PERSISTENCE_PAYLOAD_SIZE};
use crate::{Graph, GraphSnapshot, PuzzleError};

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all graph data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(PuzzleError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(PuzzleError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PuzzleError> {
        let Some(header) = bytes.get(0..HEADER_SIZE) else {
            return Err(PuzzleError::SerializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a graph to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn graph_to_bytes(graph: &Graph) -> Result<Vec<u8>, PuzzleError> {
    let header = PersistenceHeader::new();
    let snapshot = GraphSnapshot::from(graph);

    let payload = postcard::to_stdvec(&snapshot)
        .map_err(|e| PuzzleError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a graph from bytes.
///
/// This is a pure transformation - no file I/O.
///
/// Validates, in order:
/// 1. Minimum data size (header must be present)
/// 2. Maximum payload size
/// 3. Header magic bytes and version
/// 4. Graph integrity (endpoints, composites, acyclicity)
pub fn graph_from_bytes(bytes: &[u8]) -> Result<Graph, PuzzleError> {
    if bytes.len() < HEADER_SIZE {
        return Err(PuzzleError::SerializationError(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }

    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(PuzzleError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let snapshot: GraphSnapshot = postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        PuzzleError::SerializationError(format!("Failed to deserialize graph data: {}", e))
    })?;

    Graph::try_from(snapshot)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Edge, EdgeKind, Node, NodeKind};
    use std::collections::BTreeMap;

    fn sample() -> Graph {
        let mut graph = Graph::new();
        for (id, kind) in [
            ("room", NodeKind::LockedSpace),
            ("riddle", NodeKind::Puzzle),
            ("a", NodeKind::Key),
            ("b", NodeKind::Key),
            ("k", NodeKind::Key),
        ] {
            graph
                .add_node(id, kind, id, BTreeMap::new())
                .expect("add node");
        }
        graph
            .set_metadata("riddle", "answer", "clock")
            .expect("metadata");
        graph
            .add_edge_with_kind("room", "riddle", EdgeKind::Containment)
            .expect("edge");
        graph.add_edge("riddle", "a").expect("edge");
        graph.declare_composite("k", ["a", "b"]).expect("declare");
        graph
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let bytes = header.to_bytes();
        let restored = PersistenceHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored, header);
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let graph = sample();

        let bytes1 = graph_to_bytes(&graph).expect("first serialize");
        let restored = graph_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = graph_to_bytes(&restored).expect("second serialize");

        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
        assert_eq!(restored.node_count(), graph.node_count());
        assert_eq!(restored.edge_kind("room", "riddle"), Some(EdgeKind::Containment));
        assert!(restored.composite_parts("k").is_some_and(|p| p.len() == 2));
    }

    #[test]
    fn insertion_order_survives_roundtrip() {
        let graph = sample();
        let restored = graph_from_bytes(&graph_to_bytes(&graph).expect("ser")).expect("de");

        let before: Vec<_> = graph.nodes().map(|n| n.id.clone()).collect();
        let after: Vec<_> = restored.nodes().map(|n| n.id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");

        let result = graph_from_bytes(&bytes);
        assert!(matches!(result, Err(PuzzleError::SerializationError(_))));
    }

    #[test]
    fn truncated_data_rejected() {
        assert!(graph_from_bytes(b"PZG").is_err());

        let mut bytes = graph_to_bytes(&sample()).expect("ser");
        bytes.truncate(bytes.len() - 3);
        assert!(graph_from_bytes(&bytes).is_err());
    }

    #[test]
    fn cyclic_payload_rejected() {
        let snapshot = GraphSnapshot {
            nodes: vec![
                Node::new("a", NodeKind::Puzzle, "A"),
                Node::new("b", NodeKind::Puzzle, "B"),
            ],
            edges: vec![
                Edge::new("a", "b", EdgeKind::Dependency),
                Edge::new("b", "a", EdgeKind::Dependency),
            ],
            composites: Vec::new(),
        };
        let mut bytes = PersistenceHeader::new().to_bytes().to_vec();
        bytes.extend(postcard::to_stdvec(&snapshot).expect("encode"));

        assert_eq!(
            graph_from_bytes(&bytes).map(|g| g.node_count()),
            Err(PuzzleError::CyclicGraph)
        );
    }
}
