//! Canonical page model shared by every search source
//!
//! Adapters translate their service's wire shape into these types so the
//! partitioning logic never sees a collaborator-specific schema.

use crate::error::Result;
use crate::partition::Query;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Opaque item identifier plus whatever included data the service returned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ItemRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: None,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// One candidate partition reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetEntry {
    /// Value used when filtering on this entry
    pub id: String,
    /// Human-readable label
    pub display_name: String,
    /// Number of results the service reports for this entry
    pub count: u64,
}

impl FacetEntry {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, count: u64) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            count,
        }
    }
}

/// Result counts for one facet (e.g. `classifications`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetBreakdown {
    pub facet: String,
    pub entries: Vec<FacetEntry>,
}

impl FacetBreakdown {
    pub fn new(facet: impl Into<String>) -> Self {
        Self {
            facet: facet.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, entry: FacetEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest count first. Equal counts keep the service's order.
    pub fn sort_by_count_desc(&mut self) {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
    }

    /// Whether every entry is within the ceiling
    pub fn fits_under(&self, ceiling: u64) -> bool {
        self.entries.iter().all(|e| e.count <= ceiling)
    }

    /// Entries strictly smaller than `total`
    #[must_use]
    pub fn narrower_than(mut self, total: u64) -> Self {
        self.entries.retain(|e| e.count < total);
        self
    }

    /// Entries that can still narrow `query`: non-empty and not already applied
    #[must_use]
    pub fn usable_for(&self, query: &Query) -> Self {
        Self {
            facet: self.facet.clone(),
            entries: self
                .entries
                .iter()
                .filter(|e| e.count > 0 && !query.has_filter(&self.facet, &e.id))
                .cloned()
                .collect(),
        }
    }
}

/// One response of a paginated search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<ItemRef>,
    pub next_token: Option<String>,
    pub previous_token: Option<String>,
    /// Total result count hint for the whole query
    pub total: Option<u64>,
    /// Facet breakdowns, only meaningful on a query's first page
    pub refinements: Vec<FacetBreakdown>,
}

impl Page {
    pub fn new(items: Vec<ItemRef>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    #[must_use]
    pub fn with_refinement(mut self, breakdown: FacetBreakdown) -> Self {
        self.refinements.push(breakdown);
        self
    }

    /// Breakdown for a named facet, if the service returned one
    pub fn refinement(&self, facet: &str) -> Option<&FacetBreakdown> {
        self.refinements.iter().find(|r| r.facet == facet)
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.id.as_str())
    }
}

/// Everything a source needs to fetch one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub query: Query,
    pub page_size: u32,
    pub included_data: Vec<String>,
    pub page_token: Option<String>,
}

impl PageRequest {
    /// Request for the first page of `query`
    pub fn first(query: Query, page_size: u32, included_data: Vec<String>) -> Self {
        Self {
            query,
            page_size,
            included_data,
            page_token: None,
        }
    }

    /// Same request, continued at `token`
    #[must_use]
    pub fn next(&self, token: impl Into<String>) -> Self {
        Self {
            page_token: Some(token.into()),
            ..self.clone()
        }
    }
}

/// A paginated search or listing endpoint
///
/// Implementations issue exactly one physical request per call (plus
/// whatever the transport needs for auth) and map the response into a
/// [`Page`]. Errors are classified by the caller via
/// [`crate::Error::is_fatal`].
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Largest page size the service accepts
    fn max_page_size(&self) -> u32 {
        u32::MAX
    }

    /// Whether values of `facet` nest, so a query filtered on one value can
    /// be narrowed again by a more specific value of the same facet.
    ///
    /// Flat facets are never split twice along one path: their values are
    /// siblings and combining them broadens the query instead.
    fn is_hierarchical(&self, _facet: &str) -> bool {
        false
    }

    /// Fetch one page
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page>;
}
