//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::check::CheckArgs;
use crate::commands::metrics::MetricsArgs;
use crate::commands::score::ScoreArgs;

/// Calendar conflict checks and productivity metrics.
///
/// Reads events exported from the calendar store, flags overlapping or
/// unstable entries, and summarizes focus time, goals and streaks.
#[derive(Debug, Parser)]
#[command(name = "pw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check events for overlaps, ordering problems, jumps and skipped entries.
    Check(CheckArgs),

    /// Show productivity metrics for a trailing window.
    Metrics(MetricsArgs),

    /// Compute the productivity score from raw inputs.
    Score(ScoreArgs),
}
