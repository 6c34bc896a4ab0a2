//! Partition types
//!
//! Defines queries, facet filters and the partition tree.

use crate::pagination::LeafResult;
use crate::source::FacetEntry;
use serde::Serialize;
use std::fmt;

/// One applied facet value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FacetFilter {
    /// Facet name (e.g. `classifications`)
    pub facet: String,
    /// Value sent to the service
    pub value: String,
    /// Human-readable label for diagnostics
    pub label: String,
}

impl FacetFilter {
    /// Create a filter whose label is its value
    pub fn new(facet: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            facet: facet.into(),
            label: value.clone(),
            value,
        }
    }

    /// Set a display label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// An immutable search query: keywords plus applied facet filters.
///
/// Children are derived with [`Query::refine`], which appends exactly one
/// filter. Page tokens are not part of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    keywords: Vec<String>,
    filters: Vec<FacetFilter>,
}

impl Query {
    /// Create a query from keywords
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            filters: Vec::new(),
        }
    }

    /// Add a filter
    #[must_use]
    pub fn with_filter(mut self, filter: FacetFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Child query narrowed to one facet entry
    #[must_use]
    pub fn refine(&self, facet: &str, entry: &FacetEntry) -> Self {
        self.clone()
            .with_filter(FacetFilter::new(facet, &entry.id).with_label(&entry.display_name))
    }

    /// Keywords in order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Applied filters in the order they were added
    pub fn filters(&self) -> &[FacetFilter] {
        &self.filters
    }

    /// Values applied for one facet, outermost first
    pub fn filter_values(&self, facet: &str) -> Vec<&str> {
        self.filters
            .iter()
            .filter(|f| f.facet == facet)
            .map(|f| f.value.as_str())
            .collect()
    }

    /// Whether `facet=value` is already applied
    pub fn has_filter(&self, facet: &str, value: &str) -> bool {
        self.filters
            .iter()
            .any(|f| f.facet == facet && f.value == value)
    }

    /// Number of applied filters
    pub fn depth(&self) -> usize {
        self.filters.len()
    }

    /// Stable identity of the query, independent of labels
    pub fn key(&self) -> String {
        let mut key = self.keywords.join(",");
        for f in &self.filters {
            key.push('&');
            key.push_str(&f.facet);
            key.push('=');
            key.push_str(&f.value);
        }
        key
    }

    /// Human-readable partition path, e.g. `root > classifications=123[Cables]`
    pub fn path(&self) -> String {
        let mut path = String::from("root");
        for f in &self.filters {
            path.push_str(" > ");
            path.push_str(&f.facet);
            path.push('=');
            path.push_str(&f.value);
            if f.label != f.value {
                path.push('[');
                path.push_str(&f.label);
                path.push(']');
            }
        }
        path
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// One node of the partition tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionNode {
    /// Human-readable path
    pub path: String,
    /// Query this node ran
    pub query: Query,
    /// Total the server reported on the first page
    pub reported_total: Option<u64>,
    /// What happened at this node
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Leaf or interior node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Paginated directly
    Leaf {
        /// Pagination outcome
        result: LeafResult,
        /// The query was over the ceiling but could not be split further
        uncorrectable: bool,
    },
    /// Split by a facet
    Partitioned {
        /// Facet used for the split
        facet: String,
        /// Sum of the chosen entries' counts
        covered: u64,
        /// Child nodes in processing order
        children: Vec<PartitionNode>,
    },
}

impl PartitionNode {
    /// Create a leaf node
    pub fn leaf(query: Query, reported_total: Option<u64>, result: LeafResult, uncorrectable: bool) -> Self {
        Self {
            path: query.path(),
            query,
            reported_total,
            kind: NodeKind::Leaf {
                result,
                uncorrectable,
            },
        }
    }

    /// Create an interior node
    pub fn partitioned(
        query: Query,
        reported_total: Option<u64>,
        facet: impl Into<String>,
        covered: u64,
        children: Vec<PartitionNode>,
    ) -> Self {
        Self {
            path: query.path(),
            query,
            reported_total,
            kind: NodeKind::Partitioned {
                facet: facet.into(),
                covered,
                children,
            },
        }
    }

    /// Whether this node was paginated directly
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Child nodes (empty for leaves)
    pub fn children(&self) -> &[PartitionNode] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Partitioned { children, .. } => children,
        }
    }

    /// Number of leaves under this node
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf { .. } => 1,
            NodeKind::Partitioned { children, .. } => {
                children.iter().map(PartitionNode::leaf_count).sum()
            }
        }
    }
}
