//! Merging a partition tree into a collection result

use super::types::{NodeKind, PartitionNode};
use crate::pagination::{LeafResult, LeafStop};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

/// One deduplicated item, attributed to the first leaf that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectedItem {
    pub id: String,
    /// Path of the attributing leaf
    pub partition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Why a leaf could not be fully retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemReason {
    /// Over the ceiling with no depth or facet left to split on
    Uncorrectable,
    /// The page budget ran out while the server still offered a token
    CeilingReached,
}

/// A leaf whose results are known to be incomplete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblematicPartition {
    pub path: String,
    /// Total the server reported, if any
    pub expected: Option<u64>,
    pub retrieved: u64,
    pub reason: ProblemReason,
}

/// A partition that ended on a non-fatal error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBranch {
    pub path: String,
    pub error: String,
    /// Items kept from before the failure
    pub retrieved: u64,
}

/// Per-leaf accounting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafSummary {
    pub path: String,
    pub reported: Option<u64>,
    pub retrieved: u64,
    /// Items first seen in this leaf
    pub attributed: u64,
    pub stop: LeafStop,
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    pub requests: u64,
    pub pages: u64,
    pub leaves: u64,
    pub partitions: u64,
    /// Items seen again in a later leaf
    pub duplicates: u64,
    pub duration_ms: u64,
}

/// Outcome of a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectResult {
    /// Deduplicated items in first-seen order
    pub items: Vec<CollectedItem>,
    pub problematic_partitions: Vec<ProblematicPartition>,
    pub failed_branches: Vec<FailedBranch>,
    /// Protocol anomalies and coverage gaps
    pub warnings: Vec<String>,
    pub leaves: Vec<LeafSummary>,
    pub stats: CollectStats,
    pub tree: PartitionNode,
}

impl CollectResult {
    /// Merge a partition tree depth-first, in child order
    pub fn from_tree(tree: PartitionNode, elapsed: Duration) -> Self {
        let mut merger = Merger::default();
        merger.visit(&tree);

        let Merger {
            items,
            problematic_partitions,
            failed_branches,
            warnings,
            leaves,
            mut stats,
            ..
        } = merger;
        stats.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        Self {
            items,
            problematic_partitions,
            failed_branches,
            warnings,
            leaves,
            stats,
            tree,
        }
    }

    /// Item identifiers as a set
    pub fn item_ids(&self) -> BTreeSet<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }

    /// No problematic partitions and no failed branches
    pub fn is_complete(&self) -> bool {
        self.problematic_partitions.is_empty() && self.failed_branches.is_empty()
    }
}

#[derive(Default)]
struct Merger {
    seen: HashSet<String>,
    items: Vec<CollectedItem>,
    problematic_partitions: Vec<ProblematicPartition>,
    failed_branches: Vec<FailedBranch>,
    warnings: Vec<String>,
    leaves: Vec<LeafSummary>,
    stats: CollectStats,
}

impl Merger {
    fn visit(&mut self, node: &PartitionNode) {
        match &node.kind {
            NodeKind::Leaf {
                result,
                uncorrectable,
            } => self.leaf(node, result, *uncorrectable),
            NodeKind::Partitioned {
                facet,
                covered,
                children,
            } => {
                self.stats.partitions += 1;
                self.stats.requests += 1;
                self.stats.pages += 1;
                if let Some(total) = node.reported_total {
                    if *covered < total {
                        self.warnings.push(format!(
                            "{}: {facet} entries cover {covered} of {total} results",
                            node.path
                        ));
                    }
                }
                for child in children {
                    self.visit(child);
                }
            }
        }
    }

    fn leaf(&mut self, node: &PartitionNode, result: &LeafResult, uncorrectable: bool) {
        self.stats.leaves += 1;
        self.stats.requests += u64::from(result.requests);
        self.stats.pages += u64::from(result.pages);

        let mut attributed = 0;
        for item in &result.items {
            if self.seen.insert(item.id.clone()) {
                attributed += 1;
                self.items.push(CollectedItem {
                    id: item.id.clone(),
                    partition: node.path.clone(),
                    payload: item.payload.clone(),
                });
            } else {
                self.stats.duplicates += 1;
            }
        }

        let retrieved = result.retrieved();
        let reason = if uncorrectable {
            Some(ProblemReason::Uncorrectable)
        } else if matches!(result.stop, LeafStop::CeilingReached { .. }) {
            Some(ProblemReason::CeilingReached)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.problematic_partitions.push(ProblematicPartition {
                path: node.path.clone(),
                expected: node.reported_total,
                retrieved,
                reason,
            });
        }

        match &result.stop {
            LeafStop::Failed { error } => self.failed_branches.push(FailedBranch {
                path: node.path.clone(),
                error: error.clone(),
                retrieved,
            }),
            LeafStop::RepeatedToken { token } => self.warnings.push(format!(
                "{}: server repeated continuation token '{token}'",
                node.path
            )),
            LeafStop::CeilingReached { .. } => self.warnings.push(format!(
                "{}: ceiling reached after {} pages, server still offers more results",
                node.path, result.pages
            )),
            LeafStop::Exhausted | LeafStop::Sampled { .. } => {}
        }

        self.leaves.push(LeafSummary {
            path: node.path.clone(),
            reported: node.reported_total,
            retrieved,
            attributed,
            stop: result.stop.clone(),
        });
    }
}
