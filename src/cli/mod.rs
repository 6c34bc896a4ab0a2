//! CLI module
//!
//! Command-line interface for harvesting searches.
//!
//! # Commands
//!
//! - `collect` - Collect every item matching a search
//! - `explore` - Print the partition tree for a search
//! - `accounts` - List configured accounts
//! - `validate` - Render and check every account

mod commands;
mod runner;

pub use commands::{Cli, Commands, SearchArgs};
pub use runner::Runner;
