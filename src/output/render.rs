//! Result rendering
//!
//! Renders collection results and partition trees as JSON, indented text,
//! or bare item identifiers.

use crate::error::{Error, Result};
use crate::pagination::LeafStop;
use crate::partition::{
    CollectResult, CollectStats, CollectedItem, FailedBranch, LeafSummary, NodeKind,
    PartitionNode, ProblemReason, ProblematicPartition,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Human-readable summary
    Pretty,
    /// One item identifier per line
    Ids,
}

#[derive(Serialize)]
struct ResultView<'a> {
    items: &'a [CollectedItem],
    problematic_partitions: &'a [ProblematicPartition],
    failed_branches: &'a [FailedBranch],
    warnings: &'a [String],
    leaves: &'a [LeafSummary],
    stats: &'a CollectStats,
}

/// Render a collection result. The tree is left out; see [`render_tree`].
pub fn render_result(result: &CollectResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let view = ResultView {
                items: &result.items,
                problematic_partitions: &result.problematic_partitions,
                failed_branches: &result.failed_branches,
                warnings: &result.warnings,
                leaves: &result.leaves,
                stats: &result.stats,
            };
            to_json(&view)
        }
        OutputFormat::Pretty => Ok(summary(result)),
        OutputFormat::Ids => Ok(result
            .items
            .iter()
            .map(|i| format!("{}\n", i.id))
            .collect()),
    }
}

/// Render a partition tree
pub fn render_tree(tree: &PartitionNode, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(tree),
        OutputFormat::Pretty | OutputFormat::Ids => {
            let mut out = String::new();
            tree_lines(tree, 0, &mut out);
            Ok(out)
        }
    }
}

/// Write rendered output to `path`, or stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => fs::write(path, content).map_err(|e| {
            Error::output(format!("Failed to write '{}': {e}", path.display()))
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::output(e.to_string()))
}

fn summary(result: &CollectResult) -> String {
    let stats = &result.stats;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Collected {} items in {} requests ({} leaves, {} partitions, {} duplicates, {} ms)",
        result.items.len(),
        stats.requests,
        stats.leaves,
        stats.partitions,
        stats.duplicates,
        stats.duration_ms
    );

    if !result.problematic_partitions.is_empty() {
        let _ = writeln!(out, "\nProblematic partitions:");
        for p in &result.problematic_partitions {
            let expected = p
                .expected
                .map_or_else(|| "unknown".to_string(), |e| e.to_string());
            let reason = match p.reason {
                ProblemReason::Uncorrectable => "over ceiling, cannot split further",
                ProblemReason::CeilingReached => "ceiling reached with pages left",
            };
            let _ = writeln!(
                out,
                "  {}: expected {expected}, retrieved {} ({reason})",
                p.path, p.retrieved
            );
        }
    }

    if !result.failed_branches.is_empty() {
        let _ = writeln!(out, "\nFailed branches:");
        for f in &result.failed_branches {
            let _ = writeln!(out, "  {}: {} ({} items kept)", f.path, f.error, f.retrieved);
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings:");
        for w in &result.warnings {
            let _ = writeln!(out, "  {w}");
        }
    }

    out
}

fn tree_lines(node: &PartitionNode, indent: usize, out: &mut String) {
    let label = node
        .query
        .filters()
        .last()
        .map_or_else(|| node.path.clone(), |f| {
            if f.label == f.value {
                format!("{}={}", f.facet, f.value)
            } else {
                format!("{}={} [{}]", f.facet, f.value, f.label)
            }
        });
    let total = node
        .reported_total
        .map_or_else(|| "?".to_string(), |t| t.to_string());

    let _ = write!(out, "{:indent$}{label} (total {total})", "", indent = indent * 2);

    match &node.kind {
        NodeKind::Partitioned {
            facet, children, ..
        } => {
            let _ = writeln!(out, " split by {facet} into {}", children.len());
            for child in children {
                tree_lines(child, indent + 1, out);
            }
        }
        NodeKind::Leaf {
            result,
            uncorrectable,
        } => {
            let _ = write!(out, ": {} items, {} pages", result.items.len(), result.pages);
            match &result.stop {
                LeafStop::Exhausted => {}
                LeafStop::CeilingReached { .. } => out.push_str(" [ceiling reached]"),
                LeafStop::RepeatedToken { .. } => out.push_str(" [repeated token]"),
                LeafStop::Sampled { .. } => out.push_str(" [first page only]"),
                LeafStop::Failed { error } => {
                    let _ = write!(out, " [failed: {error}]");
                }
            }
            if *uncorrectable {
                out.push_str(" [uncorrectable]");
            }
            out.push('\n');
        }
    }
}
