//! CLI commands and argument parsing

use crate::output::OutputFormat;
use crate::partition::{CollectConfig, FacetFilter, Query};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ceiling-aware search harvesting for SaaS APIs
#[derive(Parser, Debug)]
#[command(name = "facet-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Accounts file (YAML or JSON)
    #[arg(long, global = true)]
    pub accounts: Option<PathBuf>,

    /// Account to use (defaults to the file's default_account)
    #[arg(short, long, global = true)]
    pub account: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect every item matching a search, partitioning around the result ceiling
    Collect {
        #[command(flatten)]
        search: SearchArgs,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the partition tree for a search, fetching one page per node
    Explore {
        #[command(flatten)]
        search: SearchArgs,

        /// Paginate leaves fully instead of sampling their first page
        #[arg(long)]
        full: bool,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List configured accounts
    Accounts,

    /// Validate the accounts file and render every account
    Validate,
}

/// Search and partitioning options shared by `collect` and `explore`
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Search keywords (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Starting facet filter, e.g. `classifications=172282` (repeatable)
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<FacetFilter>,

    /// Maximum partition depth
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Items per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Server-side result ceiling
    #[arg(long)]
    pub ceiling: Option<u64>,

    /// Candidate facets, in preference order (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub facets: Vec<String>,

    /// Extra data to request with each page (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub included_data: Vec<String>,

    /// Sibling partitions walked at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl SearchArgs {
    /// Query built from keywords and starting filters
    pub fn query(&self) -> Query {
        self.filters
            .iter()
            .cloned()
            .fold(Query::new(self.keywords.iter().cloned()), Query::with_filter)
    }

    /// Apply command-line overrides to an account's settings
    pub fn apply(&self, mut config: CollectConfig) -> CollectConfig {
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(size) = self.page_size {
            config.page_size = size;
        }
        if let Some(ceiling) = self.ceiling {
            config.ceiling = ceiling;
        }
        if !self.facets.is_empty() {
            config.facets.clone_from(&self.facets);
        }
        if !self.included_data.is_empty() {
            config.included_data.clone_from(&self.included_data);
        }
        if let Some(concurrency) = self.concurrency {
            config.branch_concurrency = concurrency.max(1);
        }
        config
    }
}

/// Parse `facet=value`
fn parse_filter(s: &str) -> Result<FacetFilter, String> {
    match s.split_once('=') {
        Some((facet, value)) if !facet.is_empty() && !value.is_empty() => {
            Ok(FacetFilter::new(facet.trim(), value.trim()))
        }
        _ => Err(format!("expected FACET=VALUE, got '{s}'")),
    }
}
