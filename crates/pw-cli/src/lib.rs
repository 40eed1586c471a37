//! planwise CLI library.
//!
//! This crate provides the `pw` command-line interface over `pw-core`.

mod cli;
pub mod commands;
mod config;
pub mod input;

pub use cli::{Cli, Commands};
pub use config::Config;
