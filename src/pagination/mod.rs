//! Pagination module
//!
//! Supports: opaque continuation tokens bounded by a result ceiling
//!
//! # Overview
//!
//! A leaf query is walked page by page. The walk ends when the server stops
//! returning a token, when the number of pages reaches what the ceiling
//! allows, or when a token comes back a second time.

mod leaf;
mod types;

pub use leaf::LeafPaginator;
pub use types::{page_budget, LeafResult, LeafStop, NextPage, PaginationState};

#[cfg(test)]
mod tests;
