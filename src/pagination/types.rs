//! Pagination types
//!
//! Defines the token-walk state and the outcome of paginating one leaf.

use crate::source::{ItemRef, Page};
use serde::Serialize;
use std::collections::HashSet;

/// Why a leaf stopped paginating
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LeafStop {
    /// The server returned no further token
    Exhausted,
    /// The page budget derived from the ceiling was used up
    CeilingReached {
        /// Token that was not followed
        next_token: String,
    },
    /// The server handed back a token this leaf had already followed
    RepeatedToken {
        /// The repeated token
        token: String,
    },
    /// Only the first page was fetched
    Sampled {
        /// Token that was not followed
        next_token: String,
    },
    /// A non-fatal error ended the walk
    Failed {
        /// Error message
        error: String,
    },
}

impl LeafStop {
    /// Whether the leaf saw every page the server offered
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Whether the stop is a protocol anomaly worth warning about
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Self::RepeatedToken { .. })
    }
}

/// Result of processing one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Follow this token
    Continue {
        /// Continuation token for the next request
        token: String,
    },
    /// Stop paginating
    Done(LeafStop),
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Tracks a token walk over one query
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: u32,
    /// Items fetched so far (before dedup)
    pub total_fetched: u64,
    /// Token for the next request
    pub cursor: Option<String>,
    /// Every token followed or offered so far
    pub seen_tokens: HashSet<String>,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
        self.cursor = None;
    }

    /// Record a page and decide what comes next.
    ///
    /// `page_budget` is the number of pages a single query may consume
    /// before the server-side ceiling makes further pages unreachable.
    pub fn record_page(&mut self, page: &Page, page_budget: u32) -> NextPage {
        self.pages += 1;
        self.total_fetched += page.items.len() as u64;

        let Some(token) = page.next_token.clone() else {
            self.mark_done();
            return NextPage::Done(LeafStop::Exhausted);
        };

        if !self.seen_tokens.insert(token.clone()) {
            self.mark_done();
            return NextPage::Done(LeafStop::RepeatedToken { token });
        }

        if self.pages >= page_budget {
            self.mark_done();
            return NextPage::Done(LeafStop::CeilingReached { next_token: token });
        }

        self.cursor = Some(token.clone());
        NextPage::Continue { token }
    }
}

/// Items and outcome of paginating one leaf query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafResult {
    /// Items in server order, duplicates included
    #[serde(skip)]
    pub items: Vec<ItemRef>,
    /// Pages received
    pub pages: u32,
    /// Requests issued, including the one that failed if any
    pub requests: u32,
    /// Why the walk stopped
    pub stop: LeafStop,
}

impl LeafResult {
    /// Number of items retrieved
    pub fn retrieved(&self) -> u64 {
        self.items.len() as u64
    }
}

/// Number of pages needed to reach `ceiling` results at `page_size` per page
pub fn page_budget(ceiling: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = ceiling.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
