//! Connected accounts
//!
//! Binds a rendered [`AccountConfig`] to an authenticated HTTP client and
//! builds the matching [`SearchSource`]. Every source built from one
//! account shares the client, so they share its token cache and pacer.

use crate::config::{AccountConfig, SourceConfig};
use crate::error::Result;
use crate::http::HttpClient;
use crate::partition::CollectConfig;
use crate::source::{AmazonCatalogSource, JsonSearchSource, SearchSource};
use tracing::debug;

/// An account ready to issue requests
#[derive(Debug, Clone)]
pub struct Account {
    name: String,
    config: AccountConfig,
    client: HttpClient,
}

impl Account {
    /// Build the HTTP client for an account
    pub fn connect(name: impl Into<String>, config: AccountConfig) -> Result<Self> {
        let name = name.into();
        let client_config = config.http.client_config(config.source.base_url());
        let client = HttpClient::with_auth(client_config, config.auth.clone())?;

        debug!(
            account = %name,
            kind = config.source.kind(),
            base_url = config.source.base_url(),
            paced = client.has_rate_limiter(),
            "Account connected"
        );

        Ok(Self {
            name,
            config,
            client,
        })
    }

    /// Account name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered configuration
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Shared HTTP client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Search source for this account
    pub fn source(&self) -> Box<dyn SearchSource> {
        match &self.config.source {
            SourceConfig::AmazonCatalog {
                marketplace_ids,
                locale,
                ..
            } => {
                let source = AmazonCatalogSource::new(self.client.clone(), marketplace_ids.clone());
                match locale {
                    Some(locale) => Box::new(source.with_locale(locale)),
                    None => Box::new(source),
                }
            }
            SourceConfig::Json { endpoint, .. } => {
                Box::new(JsonSearchSource::new(self.client.clone(), endpoint.clone()))
            }
        }
    }

    /// Collection settings, starting from the account's `search` section
    pub fn collect_config(&self) -> CollectConfig {
        self.config.search.clone()
    }
}

