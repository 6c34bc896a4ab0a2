//! Amazon Selling Partner API catalog search
//!
//! Wraps `GET /catalog/2022-04-01/items` (searchCatalogItems). The service
//! stops paginating after 1000 results per query, which is what makes
//! classification partitioning necessary for broad keyword searches.

use super::types::{FacetBreakdown, FacetEntry, ItemRef, Page, PageRequest, SearchSource};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::{JsonObject, OptionStringExt};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Search endpoint path
pub const SEARCH_PATH: &str = "/catalog/2022-04-01/items";

/// Largest `pageSize` the endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 20;

/// Hard result ceiling per query
pub const RESULT_CEILING: u64 = 1000;

/// Facet name for classification refinements
pub const CLASSIFICATIONS: &str = "classifications";

/// Facet name for brand refinements
pub const BRANDS: &str = "brands";

/// Catalog search over one or more marketplaces
#[derive(Debug, Clone)]
pub struct AmazonCatalogSource {
    client: HttpClient,
    marketplace_ids: Vec<String>,
    locale: Option<String>,
}

impl AmazonCatalogSource {
    pub fn new(client: HttpClient, marketplace_ids: Vec<String>) -> Self {
        Self {
            client,
            marketplace_ids,
            locale: None,
        }
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Translate a canonical request into SP-API query parameters
    pub fn build_request(&self, request: &PageRequest) -> RequestConfig {
        let query = &request.query;
        let mut config =
            RequestConfig::new().query("marketplaceIds", self.marketplace_ids.join(","));

        if !query.keywords().is_empty() {
            config = config.query("keywords", query.keywords().join(","));
        }

        // Nested classification filters narrow the same hierarchy; the
        // endpoint ORs a list, so only the most specific one is sent.
        if let Some(classification) = query.filter_values(CLASSIFICATIONS).last() {
            config = config.query("classificationIds", *classification);
        }

        let brands = query.filter_values(BRANDS);
        if !brands.is_empty() {
            config = config.query("brandNames", brands.join(","));
        }

        if !request.included_data.is_empty() {
            config = config.query("includedData", request.included_data.join(","));
        }

        config = config.query(
            "pageSize",
            request.page_size.clamp(1, MAX_PAGE_SIZE).to_string(),
        );

        if let Some(token) = &request.page_token {
            config = config.query("pageToken", token);
        }

        if let Some(locale) = &self.locale {
            config = config.query("locale", locale);
        }

        config
    }
}

#[async_trait]
impl SearchSource for AmazonCatalogSource {
    fn name(&self) -> &str {
        "amazon-catalog"
    }

    fn max_page_size(&self) -> u32 {
        MAX_PAGE_SIZE
    }

    fn is_hierarchical(&self, facet: &str) -> bool {
        facet == CLASSIFICATIONS
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let config = self.build_request(request);
        let response: ItemSearchResults =
            self.client.get_json_with_config(SEARCH_PATH, config).await?;
        Ok(response.into_page())
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// searchCatalogItems response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSearchResults {
    #[serde(default)]
    pub number_of_results: Option<u64>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub refinements: Option<Refinements>,
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub previous_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Refinements {
    #[serde(default)]
    pub brands: Vec<BrandRefinement>,
    #[serde(default)]
    pub classifications: Vec<ClassificationRefinement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandRefinement {
    pub number_of_results: u64,
    pub brand_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRefinement {
    pub number_of_results: u64,
    pub display_name: String,
    pub classification_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CatalogItem {
    pub asin: String,
    #[serde(flatten)]
    pub included: JsonObject,
}

impl ItemSearchResults {
    pub fn into_page(self) -> Page {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let item_ref = ItemRef::new(item.asin);
                if item.included.is_empty() {
                    item_ref
                } else {
                    item_ref.with_payload(Value::Object(item.included))
                }
            })
            .collect();

        let pagination = self.pagination.unwrap_or_default();
        let mut refinements = Vec::new();

        if let Some(r) = self.refinements {
            if !r.classifications.is_empty() {
                refinements.push(FacetBreakdown {
                    facet: CLASSIFICATIONS.to_string(),
                    entries: r
                        .classifications
                        .into_iter()
                        .map(|c| {
                            FacetEntry::new(c.classification_id, c.display_name, c.number_of_results)
                        })
                        .collect(),
                });
            }
            if !r.brands.is_empty() {
                refinements.push(FacetBreakdown {
                    facet: BRANDS.to_string(),
                    entries: r
                        .brands
                        .into_iter()
                        .map(|b| FacetEntry::new(b.brand_name.clone(), b.brand_name, b.number_of_results))
                        .collect(),
                });
            }
        }

        Page {
            items,
            next_token: pagination.next_token.none_if_empty(),
            previous_token: pagination.previous_token.none_if_empty(),
            total: self.number_of_results,
            refinements,
        }
    }
}
