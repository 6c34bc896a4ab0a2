//! Token-based leaf pagination
//!
//! Follows continuation tokens for a single query until the server stops
//! offering them, the ceiling budget runs out, or a token repeats.

use super::types::{LeafResult, LeafStop, NextPage, PaginationState};
use crate::error::Result;
use crate::source::{Page, PageRequest, SearchSource};
use tracing::{debug, warn};

/// Walks every page of one query
pub struct LeafPaginator<'a> {
    source: &'a dyn SearchSource,
    page_budget: u32,
}

impl<'a> LeafPaginator<'a> {
    /// Create a paginator limited to `page_budget` pages
    pub fn new(source: &'a dyn SearchSource, page_budget: u32) -> Self {
        Self {
            source,
            page_budget: page_budget.max(1),
        }
    }

    /// Paginate starting from an already fetched first page.
    ///
    /// Returns `Err` only for fatal errors. Any other failure ends the walk
    /// with [`LeafStop::Failed`] and keeps the items collected so far.
    pub async fn paginate(&self, first_request: &PageRequest, first_page: Page) -> Result<LeafResult> {
        let mut state = PaginationState::new();
        let mut requests = 1;
        let mut next = state.record_page(&first_page, self.page_budget);
        let mut items = first_page.items;

        let stop = loop {
            let token = match next {
                NextPage::Done(stop) => break stop,
                NextPage::Continue { token } => token,
            };

            let request = first_request.next(token);
            requests += 1;
            debug!(
                source = self.source.name(),
                page = state.pages + 1,
                token = request.page_token.as_deref().unwrap_or_default(),
                "Fetching page"
            );

            match self.source.fetch_page(&request).await {
                Ok(page) => {
                    next = state.record_page(&page, self.page_budget);
                    items.extend(page.items);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        source = self.source.name(),
                        page = state.pages + 1,
                        error = %e,
                        "Page fetch failed, keeping partial results"
                    );
                    break LeafStop::Failed {
                        error: e.to_string(),
                    };
                }
            }
        };

        match &stop {
            LeafStop::RepeatedToken { token } => warn!(
                source = self.source.name(),
                token = %token,
                pages = state.pages,
                "Server repeated a continuation token, stopping"
            ),
            LeafStop::CeilingReached { .. } => warn!(
                source = self.source.name(),
                pages = state.pages,
                retrieved = items.len(),
                "Page budget used up while the server still offers a token, results truncated"
            ),
            _ => {}
        }

        Ok(LeafResult {
            items,
            pages: state.pages,
            requests,
            stop,
        })
    }
}
