// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # facet-harvest
//!
//! Ceiling-aware pagination over SaaS search APIs.
//!
//! Many search endpoints (Amazon SP-API catalog search among them) stop
//! handing out continuation tokens after a fixed number of results. They do
//! report per-facet counts, though, so a query that is too broad can be
//! split into narrower ones that each fit under the ceiling.
//!
//! ## Features
//!
//! - **Token pagination**: follows opaque continuation tokens, stops on repeats
//! - **Facet partitioning**: depth-bounded splitting of over-ceiling queries
//! - **Deduplication**: one result set with first-seen attribution per item
//! - **Diagnostics**: uncorrectable partitions and failed branches are reported, not hidden
//! - **Multiple Auth Types**: API Key, Basic, Bearer, OAuth2 (LWA refresh tokens)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use facet_harvest::{Account, load_accounts, CollectConfig, PartitionedPaginator, Query};
//! use facet_harvest::template::TemplateContext;
//!
//! #[tokio::main]
//! async fn main() -> facet_harvest::Result<()> {
//!     let file = load_accounts("accounts.yaml")?;
//!     let config = file.resolve("amazon-eu", &TemplateContext::from_env())?;
//!     let account = Account::connect("amazon-eu", config)?;
//!
//!     let source = account.source();
//!     let result = PartitionedPaginator::new(source.as_ref(), account.collect_config())
//!         .collect(Query::new(["usb", "cable"]))
//!         .await?;
//!
//!     println!("{} items, complete: {}", result.items.len(), result.is_complete());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PartitionedPaginator                         │
//! │  collect(query) → CollectResult    explore_tree(query) → Node   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │  Source   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ API Key  │ GET/POST  │ Token walk    │ SP-API    │ JSON        │
//! │ OAuth2   │ Pacing    │ Page budget   │ JSON path │ Summary     │
//! │ Bearer   │ Retry     │ Repeat guard  │ adapters  │ Item ids    │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client with pacing and optional retries
pub mod http;

/// Search sources and the canonical page model
pub mod source;

/// Token pagination for a single query
pub mod pagination;

/// Facet partitioning and result merging
pub mod partition;

/// Accounts file
pub mod config;

/// Connected accounts
pub mod account;

/// Result rendering
pub mod output;

/// Template interpolation
pub mod template;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use account::Account;
pub use config::{load_accounts, load_accounts_from_str, AccountConfig, AccountsFile};
pub use error::{Error, Result};
pub use partition::{CollectConfig, CollectResult, PartitionedPaginator, Query};
pub use source::{Page, PageRequest, SearchSource};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
