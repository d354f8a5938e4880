//! # puzzlegraph CLI Module
//!
//! This module implements the CLI interface for puzzlegraph.
//!
//! ## Available Commands
//!
//! - `init` - Create an empty graph file
//! - `load` - Build a graph from a JSON or TOML blueprint
//! - `export` - Write the graph as a blueprint or binary file
//! - `status` - Show graph metrics
//! - `order` - Print a valid solving order
//! - `reach` / `prereqs` - Forward and backward reachability
//! - `contents` - Direct contents of a locked space
//! - `satisfied` - Check a key against a set of held keys
//! - `accessible` - List what can be solved next
//! - `demo` - Walk through the perfumer's lair example room

mod commands;
mod demo;

use clap::{Parser, Subcommand};
use puzzlegraph_core::PuzzleError;
use std::path::PathBuf;

pub use commands::*;
pub use demo::{Step, cmd_demo, lair_attempts, perfumers_lair, play};

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// puzzlegraph - escape-room puzzle dependencies as a validated DAG.
///
/// Puzzles, locks, keys and locked spaces are nodes; an edge `a -> b`
/// means `a` must be resolved before `b` becomes accessible.
#[derive(Parser, Debug)]
#[command(name = "puzzlegraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the graph file
    #[arg(short = 'g', long, global = true, default_value = "puzzlegraph.pzg")]
    pub graph: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty graph file
    Init {
        /// Force initialization even if the graph file exists
        #[arg(short, long)]
        force: bool,
    },

    /// Build the graph from a blueprint file
    Load {
        /// Path to the blueprint
        #[arg(short, long)]
        file: PathBuf,

        /// Blueprint format (json, toml); guessed from the extension if omitted
        #[arg(short = 't', long)]
        format: Option<String>,
    },

    /// Export the graph
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (blueprint-json, blueprint-toml, binary)
        #[arg(short = 't', long, default_value = "blueprint-json")]
        format: String,
    },

    /// Show graph status
    Status,

    /// Print a solving order (dependencies first)
    Order {
        /// Group the order into layers
        #[arg(short, long)]
        layers: bool,
    },

    /// Everything that depends on a node, directly or transitively
    Reach {
        /// Node ID
        #[arg(long)]
        id: String,
    },

    /// Everything a node depends on, directly or transitively
    Prereqs {
        /// Node ID
        #[arg(long)]
        id: String,
    },

    /// What a locked space directly contains
    Contents {
        /// Space node ID
        #[arg(long)]
        id: String,
    },

    /// Check whether a key is satisfied by the held keys
    Satisfied {
        /// Key node ID
        #[arg(short, long)]
        key: String,

        /// Held key IDs (comma-separated)
        #[arg(long, value_delimiter = ',')]
        held: Vec<String>,
    },

    /// List nodes that can be resolved next
    Accessible {
        /// Resolved node IDs (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        resolved: Vec<String>,
    },

    /// Build and play through the perfumer's lair example room
    Demo {
        /// Also save the demo graph to the graph file
        #[arg(short, long)]
        save: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), PuzzleError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&cli.graph, force),
        Some(Commands::Load { file, format }) => {
            cmd_load(&cli.graph, json_mode, &file, format.as_deref())
        }
        Some(Commands::Export { output, format }) => cmd_export(&cli.graph, &output, &format),
        Some(Commands::Status) => cmd_status(&cli.graph, json_mode),
        Some(Commands::Order { layers }) => cmd_order(&cli.graph, json_mode, layers),
        Some(Commands::Reach { id }) => cmd_reach(&cli.graph, json_mode, &id),
        Some(Commands::Prereqs { id }) => cmd_prereqs(&cli.graph, json_mode, &id),
        Some(Commands::Contents { id }) => cmd_contents(&cli.graph, json_mode, &id),
        Some(Commands::Satisfied { key, held }) => {
            cmd_satisfied(&cli.graph, json_mode, &key, &held)
        }
        Some(Commands::Accessible { resolved }) => {
            cmd_accessible(&cli.graph, json_mode, &resolved)
        }
        Some(Commands::Demo { save }) => cmd_demo(&cli.graph, json_mode, save),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.graph, json_mode)
        }
    }
}
