//! # puzzlegraph
//!
//! Library half of the puzzlegraph binary, exposed so the command
//! implementations can be exercised from integration tests.

pub mod cli;
