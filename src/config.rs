//! Account configuration
//!
//! An accounts file names every service account the CLI can talk to:
//!
//! ```yaml
//! default_account: amazon-eu
//! accounts:
//!   amazon-eu:
//!     source:
//!       kind: amazon_catalog
//!       base_url: https://sellingpartnerapi-eu.amazon.com
//!       marketplace_ids: [A1PA6795UKMFR9]
//!     auth:
//!       type: oauth2_refresh
//!       token_url: https://api.amazon.com/auth/o2/token
//!       client_id: "{{ env.LWA_CLIENT_ID }}"
//!       client_secret: "{{ env.LWA_CLIENT_SECRET }}"
//!       refresh_token: "{{ env.LWA_REFRESH_TOKEN }}"
//!       token_header: x-amz-access-token
//!     search:
//!       max_depth: 2
//! ```
//!
//! Accounts are kept as raw JSON until selected, so templates of accounts
//! that are not used never need their environment variables.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::partition::CollectConfig;
use crate::source::{amazon, json, JsonSourceConfig};
use crate::template::{render_value, TemplateContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default accounts file name, looked up in the working directory
pub const DEFAULT_ACCOUNTS_FILE: &str = "accounts.yaml";

// ============================================================================
// Accounts File
// ============================================================================

/// Parsed accounts file with unrendered account bodies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsFile {
    /// Account used when none is named
    #[serde(default)]
    pub default_account: Option<String>,

    /// Raw account definitions by name
    #[serde(default)]
    pub accounts: BTreeMap<String, Value>,
}

impl AccountsFile {
    /// Account names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    /// Pick an account name: explicit, then the default, then the only one
    pub fn select<'a>(&'a self, name: Option<&'a str>) -> Result<&'a str> {
        let name = match (name, self.default_account.as_deref()) {
            (Some(name), _) | (None, Some(name)) => name,
            (None, None) if self.accounts.len() == 1 => {
                return Ok(self.names().next().unwrap_or_default());
            }
            (None, None) => {
                return Err(Error::config(
                    "No account selected and no default_account set; use --account",
                ))
            }
        };

        if self.accounts.contains_key(name) {
            Ok(name)
        } else {
            Err(Error::config(format!(
                "Unknown account '{name}'. Available: {}",
                self.names().collect::<Vec<_>>().join(", ")
            )))
        }
    }

    /// Render and validate one account
    pub fn resolve(&self, name: &str, ctx: &TemplateContext) -> Result<AccountConfig> {
        let raw = self
            .accounts
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown account '{name}'")))?;

        let rendered = render_value(raw, ctx)?;
        let config: AccountConfig = serde_json::from_value(rendered)
            .map_err(|e| Error::config(format!("Invalid account '{name}': {e}")))?;

        config.validate(name)?;
        Ok(config)
    }
}

/// Load an accounts file (YAML or JSON)
pub fn load_accounts(path: impl AsRef<Path>) -> Result<AccountsFile> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read accounts file '{}': {e}",
                path.display()
            ))
        }
    })?;
    load_accounts_from_str(&content)
}

/// Load an accounts file from a string
pub fn load_accounts_from_str(content: &str) -> Result<AccountsFile> {
    let file: AccountsFile = serde_yaml::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse accounts file: {e}")))?;

    if file.accounts.is_empty() {
        return Err(Error::config("Accounts file defines no accounts"));
    }
    if let Some(default) = &file.default_account {
        if !file.accounts.contains_key(default) {
            return Err(Error::invalid_value(
                "default_account",
                format!("'{default}' is not a defined account"),
            ));
        }
    }
    Ok(file)
}

// ============================================================================
// Account Config
// ============================================================================

/// One fully rendered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Free-form description shown by `accounts`
    #[serde(default)]
    pub description: Option<String>,

    /// Which search endpoint to use
    pub source: SourceConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpSettings,

    /// Collection defaults
    #[serde(default)]
    pub search: CollectConfig,
}

/// Search endpoint for an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Amazon SP-API catalog search
    AmazonCatalog {
        /// Regional SP-API endpoint
        base_url: String,
        /// Marketplaces to search
        marketplace_ids: Vec<String>,
        /// Locale for localized summaries
        #[serde(default)]
        locale: Option<String>,
    },

    /// Any JSON listing described by paths
    Json {
        /// API base URL
        base_url: String,
        /// Endpoint description
        endpoint: JsonSourceConfig,
    },
}

impl SourceConfig {
    /// Base URL of the API
    pub fn base_url(&self) -> &str {
        match self {
            Self::AmazonCatalog { base_url, .. } | Self::Json { base_url, .. } => base_url,
        }
    }

    /// Largest page size the endpoint accepts
    pub fn max_page_size(&self) -> u32 {
        match self {
            Self::AmazonCatalog { .. } => amazon::MAX_PAGE_SIZE,
            Self::Json { endpoint, .. } => endpoint.max_page_size,
        }
    }

    /// Short kind label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AmazonCatalog { .. } => "amazon_catalog",
            Self::Json { .. } => "json",
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Minimum delay between requests; 0 disables pacing
    pub request_delay_ms: u64,
    /// Transport-level retries
    pub max_retries: u32,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            request_delay_ms: 500,
            max_retries: 0,
            user_agent: None,
        }
    }
}

impl HttpSettings {
    /// Client configuration for `base_url`
    pub fn client_config(&self, base_url: &str) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .request_delay(Duration::from_millis(self.request_delay_ms));
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }
}

impl AccountConfig {
    /// Check the account for values that can never work
    pub fn validate(&self, name: &str) -> Result<()> {
        let field = |f: &str| format!("accounts.{name}.{f}");

        let base_url = self.source.base_url();
        if base_url.is_empty() {
            return Err(Error::missing_field(field("source.base_url")));
        }
        url::Url::parse(base_url)
            .map_err(|e| Error::invalid_value(field("source.base_url"), e.to_string()))?;

        match &self.source {
            SourceConfig::AmazonCatalog {
                marketplace_ids, ..
            } if marketplace_ids.is_empty() => {
                return Err(Error::missing_field(field("source.marketplace_ids")));
            }
            SourceConfig::Json { endpoint, .. } => {
                if endpoint.items_path.is_empty() {
                    return Err(Error::missing_field(field("source.endpoint.items_path")));
                }
                json::validate_path(&endpoint.items_path).map_err(|e| {
                    Error::invalid_value(field("source.endpoint.items_path"), e.to_string())
                })?;
                for mapping in &endpoint.refinements {
                    json::validate_path(&mapping.path).map_err(|e| {
                        Error::invalid_value(field("source.endpoint.refinements"), e.to_string())
                    })?;
                }
            }
            SourceConfig::AmazonCatalog { .. } => {}
        }

        let search = &self.search;
        if search.page_size == 0 {
            return Err(Error::invalid_value(
                field("search.page_size"),
                "must be greater than 0",
            ));
        }
        let max = self.source.max_page_size();
        if search.page_size > max {
            return Err(Error::invalid_value(
                field("search.page_size"),
                format!("{} exceeds the endpoint maximum of {max}", search.page_size),
            ));
        }
        if search.ceiling == 0 {
            return Err(Error::invalid_value(
                field("search.ceiling"),
                "must be greater than 0",
            ));
        }
        if search.branch_concurrency == 0 {
            return Err(Error::invalid_value(
                field("search.branch_concurrency"),
                "must be at least 1",
            ));
        }
        if search.max_depth > 0 && search.facets.is_empty() {
            return Err(Error::invalid_value(
                field("search.facets"),
                "partitioning needs at least one facet when max_depth > 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
