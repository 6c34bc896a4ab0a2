//! Facet partitioning module
//!
//! Supports: depth-bounded splitting of over-ceiling queries by facet
//!
//! # Overview
//!
//! Search services that stop paginating after a fixed number of results
//! still report per-facet counts. A query over the ceiling is split into
//! one child per facet entry; each child is walked independently and the
//! leaves are merged into one deduplicated result.

mod collector;
mod report;
mod types;

pub use collector::{CollectConfig, PartitionedPaginator};
pub use report::{
    CollectResult, CollectStats, CollectedItem, FailedBranch, LeafSummary, ProblemReason,
    ProblematicPartition,
};
pub use types::{FacetFilter, NodeKind, PartitionNode, Query};
