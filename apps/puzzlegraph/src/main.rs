//! # puzzlegraph
//!
//! The command-line tool for puzzlegraph room graphs.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │         apps/puzzlegraph (THE BINARY)         │
//! │                                               │
//! │   ┌─────────────┐        ┌───────────────┐    │
//! │   │    CLI      │        │   File I/O    │    │
//! │   │   (clap)    │        │ (graph files) │    │
//! │   └──────┬──────┘        └───────┬───────┘    │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │             ┌──────────────────┐              │
//! │             │ puzzlegraph-core │              │
//! │             │   (THE LOGIC)    │              │
//! │             └──────────────────┘              │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! puzzlegraph init
//! puzzlegraph load -f lair.toml -t toml
//! puzzlegraph order
//! puzzlegraph reach --id riddle
//! puzzlegraph accessible --resolved riddle,vial
//! ```

use clap::Parser;
use puzzlegraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // PUZZLEGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("PUZZLEGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose {
        "puzzlegraph=debug,puzzlegraph_core=debug"
    } else {
        "puzzlegraph=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  puzzlegraph v{}
  Locks • Keys • Puzzles • Locked spaces
"#,
        env!("CARGO_PKG_VERSION")
    );
}
