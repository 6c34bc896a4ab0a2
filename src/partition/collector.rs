//! Ceiling-bounded collection with facet partitioning
//!
//! Walks a search endpoint page by page. When a query reports more results
//! than the ceiling allows, it is split along a facet so every partition
//! fits under the ceiling, and each partition is walked on its own.

use super::report::CollectResult;
use super::types::{PartitionNode, Query};
use crate::error::Result;
use crate::pagination::{page_budget, LeafPaginator, LeafResult, LeafStop};
use crate::source::{FacetBreakdown, Page, PageRequest, SearchSource};
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tuning for one collection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Most results the server will page through for one query
    pub ceiling: u64,
    /// How many times a query may be split
    pub max_depth: u32,
    /// Items per page
    pub page_size: u32,
    /// Candidate facets, in preference order
    pub facets: Vec<String>,
    /// Extra data requested with every page
    pub included_data: Vec<String>,
    /// Sibling partitions walked at the same time
    pub branch_concurrency: usize,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            ceiling: 1000,
            max_depth: 2,
            page_size: 20,
            facets: vec!["classifications".to_string()],
            included_data: vec!["summaries".to_string()],
            branch_concurrency: 1,
        }
    }
}

impl CollectConfig {
    /// Pages one query may consume before the ceiling cuts it off
    pub fn page_budget(&self) -> u32 {
        page_budget(self.ceiling, self.page_size)
    }
}

/// Collects every item a query matches, partitioning around the ceiling
pub struct PartitionedPaginator<'a> {
    source: &'a dyn SearchSource,
    config: CollectConfig,
    survey: bool,
}

impl<'a> PartitionedPaginator<'a> {
    /// Create a collector. The page size is clamped to what the source accepts.
    pub fn new(source: &'a dyn SearchSource, mut config: CollectConfig) -> Self {
        config.page_size = config.page_size.clamp(1, source.max_page_size().max(1));
        Self {
            source,
            config,
            survey: false,
        }
    }

    /// Stop every leaf after its first page.
    ///
    /// The tree still shows how queries would be split, at the cost of one
    /// request per node.
    #[must_use]
    pub fn survey(mut self) -> Self {
        self.survey = true;
        self
    }

    /// Effective configuration
    pub fn config(&self) -> &CollectConfig {
        &self.config
    }

    /// Collect the deduplicated items for `query`.
    ///
    /// Non-fatal failures end only the partition they happen in and are
    /// reported in the result. Fatal errors abort the whole run.
    pub async fn collect(&self, query: Query) -> Result<CollectResult> {
        let started = Instant::now();
        info!(
            source = self.source.name(),
            query = %query,
            ceiling = self.config.ceiling,
            max_depth = self.config.max_depth,
            "Starting collection"
        );

        let tree = self.explore_tree(query).await?;
        let result = CollectResult::from_tree(tree, started.elapsed());

        info!(
            items = result.items.len(),
            leaves = result.stats.leaves,
            requests = result.stats.requests,
            duplicates = result.stats.duplicates,
            problematic = result.problematic_partitions.len(),
            failed = result.failed_branches.len(),
            "Collection finished"
        );
        Ok(result)
    }

    /// Build the partition tree without merging it
    pub async fn explore_tree(&self, query: Query) -> Result<PartitionNode> {
        self.explore(query, self.config.max_depth).await
    }

    fn explore(&self, query: Query, depth: u32) -> BoxFuture<'_, Result<PartitionNode>> {
        async move {
            let request = PageRequest::first(
                query.clone(),
                self.config.page_size,
                self.config.included_data.clone(),
            );

            let first = match self.source.fetch_page(&request).await {
                Ok(page) => page,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(path = %query, error = %e, "First page failed, abandoning partition");
                    let result = LeafResult {
                        items: Vec::new(),
                        pages: 0,
                        requests: 1,
                        stop: LeafStop::Failed {
                            error: e.to_string(),
                        },
                    };
                    return Ok(PartitionNode::leaf(query, None, result, false));
                }
            };

            let total = first.total;
            let over_ceiling = total.is_some_and(|t| t > self.config.ceiling);

            if over_ceiling && depth > 0 {
                if let Some(breakdown) = self.choose_facet(&query, &first) {
                    return self.split(query, total, breakdown, depth).await;
                }
                debug!(path = %query, filters = query.depth(), "No usable facet breakdown");
            }

            if over_ceiling {
                warn!(
                    path = %query,
                    total = total.unwrap_or_default(),
                    ceiling = self.config.ceiling,
                    depth_left = depth,
                    "Partition exceeds ceiling and cannot be split, paginating best-effort"
                );
            }

            let result = if self.survey {
                sampled(first)
            } else {
                LeafPaginator::new(self.source, self.config.page_budget())
                    .paginate(&request, first)
                    .await?
            };

            debug!(
                path = %query,
                filters = query.depth(),
                retrieved = result.items.len(),
                pages = result.pages,
                "Leaf finished"
            );
            Ok(PartitionNode::leaf(query, total, result, over_ceiling))
        }
        .boxed()
    }

    async fn split(
        &self,
        query: Query,
        total: Option<u64>,
        breakdown: FacetBreakdown,
        depth: u32,
    ) -> Result<PartitionNode> {
        let covered: u64 = breakdown.entries.iter().map(|e| e.count).sum();
        info!(
            path = %query,
            total = total.unwrap_or_default(),
            facet = %breakdown.facet,
            partitions = breakdown.entries.len(),
            covered,
            "Splitting partition"
        );

        let children: Vec<Query> = breakdown
            .entries
            .iter()
            .map(|entry| query.refine(&breakdown.facet, entry))
            .collect();

        let children = stream::iter(children)
            .map(|child| self.explore(child, depth - 1))
            .buffered(self.config.branch_concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await?;

        Ok(PartitionNode::partitioned(
            query,
            total,
            breakdown.facet,
            covered,
            children,
        ))
    }

    /// Pick the facet to split on.
    ///
    /// Among the configured facets present on the page, the one whose
    /// entries all fit under the ceiling with the fewest entries wins.
    /// Otherwise the first configured facet with usable entries is used.
    /// Entries come back sorted by descending count.
    ///
    /// A facet already filtered on is only split again when the source says
    /// it nests, and then only into entries smaller than the page total.
    pub fn choose_facet(&self, query: &Query, page: &Page) -> Option<FacetBreakdown> {
        let candidates: Vec<FacetBreakdown> = self
            .config
            .facets
            .iter()
            .filter_map(|facet| {
                let usable = page.refinement(facet)?.usable_for(query);
                if query.filter_values(facet).is_empty() {
                    Some(usable)
                } else if self.source.is_hierarchical(facet) {
                    Some(usable.narrower_than(page.total?))
                } else {
                    None
                }
            })
            .filter(|breakdown| !breakdown.is_empty())
            .collect();

        let mut chosen = candidates
            .iter()
            .filter(|b| b.fits_under(self.config.ceiling))
            .min_by_key(|b| b.entries.len())
            .or_else(|| candidates.first())?
            .clone();

        chosen.sort_by_count_desc();
        Some(chosen)
    }
}

fn sampled(first: Page) -> LeafResult {
    let stop = match first.next_token {
        Some(next_token) => LeafStop::Sampled { next_token },
        None => LeafStop::Exhausted,
    };
    LeafResult {
        items: first.items,
        pages: 1,
        requests: 1,
        stop,
    }
}
