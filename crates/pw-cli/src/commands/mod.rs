//! CLI subcommand implementations.

pub mod check;
pub mod metrics;
pub mod score;
pub mod util;
