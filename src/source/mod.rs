//! Search sources
//!
//! Supports: Amazon SP-API catalog search, configurable JSON listings
//!
//! # Overview
//!
//! A [`SearchSource`] is the only thing the partitioning logic talks to.
//! Each adapter owns its wire types and maps them onto the canonical
//! [`Page`]; new services are added by implementing the trait.

pub mod amazon;
pub mod json;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use amazon::AmazonCatalogSource;
pub use json::{JsonSearchSource, JsonSourceConfig, RefinementMapping};
pub use types::{FacetBreakdown, FacetEntry, ItemRef, Page, PageRequest, SearchSource};
