//! Score command: evaluates the productivity formula for given inputs.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use pw_core::{ProductivityInputs, calculate_productivity_score};

#[derive(Debug, Args)]
pub struct ScoreArgs {
    /// Minutes spent in focus categories.
    #[arg(long, default_value_t = 0.0)]
    pub focus: f64,

    /// Total tracked minutes.
    #[arg(long, default_value_t = 0.0)]
    pub tracked: f64,

    /// Goal completion rate in percent.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub goal_rate: f64,

    /// Number of context switches.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub switches: i64,
}

pub fn run<W: Write>(writer: &mut W, args: &ScoreArgs) -> Result<()> {
    let score = calculate_productivity_score(&ProductivityInputs {
        focus_time_minutes: args.focus,
        goal_completion_rate: args.goal_rate,
        context_switches: args.switches,
        total_tracked_minutes: args.tracked,
    });
    writeln!(writer, "{score}")?;
    Ok(())
}
