//! CLI runner - executes commands

use crate::account::Account;
use crate::cli::commands::{Cli, Commands, SearchArgs};
use crate::config::{load_accounts, AccountsFile, SourceConfig, DEFAULT_ACCOUNTS_FILE};
use crate::error::{Error, Result};
use crate::output::{render_result, render_tree, write_output, OutputFormat};
use crate::partition::{PartitionedPaginator, Query};
use crate::source::amazon::CLASSIFICATIONS;
use crate::template::TemplateContext;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Collect { search, output } => {
                self.collect(search, output.as_deref()).await
            }
            Commands::Explore {
                search,
                full,
                output,
            } => self.explore(search, *full, output.as_deref()).await,
            Commands::Accounts => self.accounts(),
            Commands::Validate => self.validate(),
        }
    }

    fn accounts_path(&self) -> PathBuf {
        self.cli
            .accounts
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ACCOUNTS_FILE))
    }

    fn load_accounts(&self) -> Result<AccountsFile> {
        load_accounts(self.accounts_path())
    }

    /// Render the selected account and build its client
    fn connect(&self) -> Result<Account> {
        let file = self.load_accounts()?;
        let name = file.select(self.cli.account.as_deref())?;
        let config = file.resolve(name, &TemplateContext::from_env())?;
        Account::connect(name, config)
    }

    async fn collect(&self, search: &SearchArgs, output: Option<&Path>) -> Result<()> {
        let account = self.connect()?;
        let query = search.query();
        check_query(&account, &query)?;

        let source = account.source();
        let config = search.apply(account.collect_config());
        let result = PartitionedPaginator::new(source.as_ref(), config)
            .collect(query)
            .await?;

        if result.is_complete() {
            info!(account = account.name(), items = result.items.len(), "Collected");
        } else {
            warn!(
                account = account.name(),
                items = result.items.len(),
                problematic = result.problematic_partitions.len(),
                failed = result.failed_branches.len(),
                "Collection is incomplete"
            );
        }

        let rendered = render_result(&result, self.cli.format)?;
        write_output(&rendered, output)
    }

    async fn explore(&self, search: &SearchArgs, full: bool, output: Option<&Path>) -> Result<()> {
        let account = self.connect()?;
        let query = search.query();
        check_query(&account, &query)?;

        let source = account.source();
        let config = search.apply(account.collect_config());
        let mut paginator = PartitionedPaginator::new(source.as_ref(), config);
        if !full {
            paginator = paginator.survey();
        }

        let tree = paginator.explore_tree(query).await?;
        info!(leaves = tree.leaf_count(), "Explored partition tree");

        let rendered = render_tree(&tree, self.cli.format)?;
        write_output(&rendered, output)
    }

    /// List accounts without rendering their templates
    fn accounts(&self) -> Result<()> {
        let file = self.load_accounts()?;
        let default = file.default_account.as_deref();

        let rows: Vec<Value> = file
            .accounts
            .iter()
            .map(|(name, raw)| {
                json!({
                    "name": name,
                    "default": Some(name.as_str()) == default,
                    "kind": raw.pointer("/source/kind").cloned().unwrap_or(Value::Null),
                    "base_url": raw.pointer("/source/base_url").cloned().unwrap_or(Value::Null),
                    "description": raw.get("description").cloned().unwrap_or(Value::Null),
                })
            })
            .collect();

        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string_pretty(&rows)?,
            OutputFormat::Ids => file.names().map(|n| format!("{n}\n")).collect(),
            OutputFormat::Pretty => rows
                .iter()
                .map(|row| {
                    let marker = if row["default"] == true { "*" } else { " " };
                    format!(
                        "{marker} {:<20} {:<16} {}\n",
                        row["name"].as_str().unwrap_or_default(),
                        row["kind"].as_str().unwrap_or("?"),
                        row["description"]
                            .as_str()
                            .or_else(|| row["base_url"].as_str())
                            .unwrap_or_default()
                    )
                })
                .collect(),
        };
        write_output(&rendered, None)
    }

    /// Render every account and report which ones are unusable
    fn validate(&self) -> Result<()> {
        let file = self.load_accounts()?;
        let ctx = TemplateContext::from_env();

        let mut failures = 0;
        let mut lines = String::new();
        for name in file.names() {
            match file.resolve(name, &ctx) {
                Ok(config) => {
                    lines.push_str(&format!(
                        "✓ {name} ({}, {})\n",
                        config.source.kind(),
                        config.source.base_url()
                    ));
                }
                Err(e) => {
                    failures += 1;
                    lines.push_str(&format!("✗ {name}: {e}\n"));
                }
            }
        }
        write_output(&lines, None)?;

        if failures == 0 {
            Ok(())
        } else {
            Err(Error::config(format!(
                "{failures} account(s) in '{}' are invalid",
                self.accounts_path().display()
            )))
        }
    }
}

/// Reject searches the service cannot answer
fn check_query(account: &Account, query: &Query) -> Result<()> {
    if let SourceConfig::AmazonCatalog { .. } = account.config().source {
        if query.keywords().is_empty() && query.filter_values(CLASSIFICATIONS).is_empty() {
            return Err(Error::config(
                "Catalog search needs --keywords or a classifications filter",
            ));
        }
    }
    Ok(())
}
