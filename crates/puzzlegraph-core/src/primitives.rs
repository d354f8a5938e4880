//! # Primitives
//!
//! Hardcoded constants for the puzzlegraph CORE.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Magic bytes for the puzzlegraph binary format header.
///
/// - File Header = Magic Bytes ("PZGR") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"PZGR";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the persistence header in bytes (magic + version).
pub const HEADER_SIZE: usize = 5;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a node identifier, in bytes.
pub const MAX_ID_LENGTH: usize = 256;

/// Maximum length of a node display name, in bytes.
pub const MAX_NAME_LENGTH: usize = 1024;

/// Maximum number of nodes accepted from a single blueprint.
///
/// Blueprints above this size are rejected before any node is built.
pub const MAX_BLUEPRINT_NODES: usize = 100_000;

/// Maximum number of edges accepted from a single blueprint.
pub const MAX_BLUEPRINT_EDGES: usize = 1_000_000;

/// Maximum allowed payload size for the persistence format (64 MB).
///
/// Validated BEFORE attempting deserialization.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;
