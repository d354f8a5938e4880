//! # Formats Module
//!
//! Binary persistence for puzzle graphs. File I/O stays in the app layer;
//! everything here is a pure bytes <-> graph transformation.

pub mod persistence;

pub use persistence::{PersistenceHeader, graph_from_bytes, graph_to_bytes};
