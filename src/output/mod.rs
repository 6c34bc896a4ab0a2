//! Output module
//!
//! Renders collection results for the CLI.
//!
//! # Overview
//!
//! This module provides:
//! - JSON output of the merged result or the partition tree
//! - An indented human-readable summary
//! - Plain identifier lists for piping into other tools

mod render;

pub use render::{render_result, render_tree, write_output, OutputFormat};
