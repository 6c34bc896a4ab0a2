//! Configurable JSON search source
//!
//! Maps any cursor-paginated JSON listing onto the canonical page model by
//! dotted paths. Used for services whose search shape is simple enough to
//! describe declaratively (n8n executions, Celigo flows, Plytix products).

use super::types::{FacetBreakdown, FacetEntry, ItemRef, Page, PageRequest, SearchSource};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::{Method, OptionStringExt};
use async_trait::async_trait;
use jsonpath_rust::JsonPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// How a facet breakdown is read from the response and sent back as a filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementMapping {
    /// Canonical facet name
    pub facet: String,
    /// Path to the array of facet entries
    pub path: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_label_field")]
    pub label_field: String,
    #[serde(default = "default_count_field")]
    pub count_field: String,
    /// Request parameter carrying the chosen values
    pub param: String,
}

/// Endpoint description for [`JsonSearchSource`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSourceConfig {
    /// Endpoint path relative to the account's base URL
    pub path: String,
    #[serde(default)]
    pub method: Method,
    /// Path to the array of items
    pub items_path: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default)]
    pub next_token_path: Option<String>,
    #[serde(default)]
    pub total_path: Option<String>,
    #[serde(default)]
    pub refinements: Vec<RefinementMapping>,
    #[serde(default)]
    pub keywords_param: Option<String>,
    #[serde(default)]
    pub page_size_param: Option<String>,
    #[serde(default = "default_page_token_param")]
    pub page_token_param: String,
    #[serde(default)]
    pub included_data_param: Option<String>,
    /// Fixed parameters sent with every request
    #[serde(default)]
    pub static_params: BTreeMap<String, String>,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_label_field() -> String {
    "name".to_string()
}

fn default_count_field() -> String {
    "count".to_string()
}

fn default_page_token_param() -> String {
    "cursor".to_string()
}

fn default_max_page_size() -> u32 {
    250
}

/// Generic JSON search source
#[derive(Debug, Clone)]
pub struct JsonSearchSource {
    client: HttpClient,
    config: JsonSourceConfig,
}

impl JsonSearchSource {
    pub fn new(client: HttpClient, config: JsonSourceConfig) -> Self {
        Self { client, config }
    }

    /// Request parameters for `request`, in a stable order
    pub fn build_params(&self, request: &PageRequest) -> Vec<(String, String)> {
        let cfg = &self.config;
        let mut params: Vec<(String, String)> = cfg
            .static_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(param) = &cfg.keywords_param {
            if !request.query.keywords().is_empty() {
                params.push((param.clone(), request.query.keywords().join(",")));
            }
        }

        for mapping in &cfg.refinements {
            let values = request.query.filter_values(&mapping.facet);
            if !values.is_empty() {
                params.push((mapping.param.clone(), values.join(",")));
            }
        }

        if let Some(param) = &cfg.included_data_param {
            if !request.included_data.is_empty() {
                params.push((param.clone(), request.included_data.join(",")));
            }
        }

        if let Some(param) = &cfg.page_size_param {
            let size = request.page_size.clamp(1, cfg.max_page_size);
            params.push((param.clone(), size.to_string()));
        }

        if let Some(token) = &request.page_token {
            params.push((cfg.page_token_param.clone(), token.clone()));
        }

        params
    }

    /// Map a response body onto a page
    pub fn parse_page(&self, body: &Value) -> Result<Page> {
        let cfg = &self.config;

        let raw_items = select_array(body, &cfg.items_path)?.ok_or_else(|| {
            Error::decode(format!("No item array at '{}'", cfg.items_path))
        })?;

        let items = raw_items
            .iter()
            .map(|item| {
                lookup(item, &cfg.id_field)
                    .and_then(value_as_string)
                    .map(|id| ItemRef::new(id).with_payload(item.clone()))
                    .ok_or_else(|| {
                        Error::decode(format!("Item without '{}' field", cfg.id_field))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let next_token = cfg
            .next_token_path
            .as_deref()
            .and_then(|p| lookup(body, p))
            .and_then(value_as_string)
            .none_if_empty();

        let total = cfg
            .total_path
            .as_deref()
            .and_then(|p| lookup(body, p))
            .and_then(value_as_u64);

        let refinements = cfg
            .refinements
            .iter()
            .map(|mapping| parse_refinement(body, mapping))
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            next_token,
            previous_token: None,
            total,
            refinements,
        })
    }
}

fn parse_refinement(body: &Value, mapping: &RefinementMapping) -> Result<Option<FacetBreakdown>> {
    let Some(entries) = select_array(body, &mapping.path)? else {
        return Ok(None);
    };
    let entries: Vec<FacetEntry> = entries
        .iter()
        .filter_map(|entry| {
            let id = lookup(entry, &mapping.id_field).and_then(value_as_string)?;
            let label = lookup(entry, &mapping.label_field)
                .and_then(value_as_string)
                .unwrap_or_else(|| id.clone());
            let count = lookup(entry, &mapping.count_field).and_then(value_as_u64)?;
            Some(FacetEntry::new(id, label, count))
        })
        .collect();

    Ok(Some(FacetBreakdown {
        facet: mapping.facet.clone(),
        entries,
    }))
}

#[async_trait]
impl SearchSource for JsonSearchSource {
    fn name(&self) -> &str {
        &self.config.path
    }

    fn max_page_size(&self) -> u32 {
        self.config.max_page_size
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let params = self.build_params(request);

        let body: Value = match self.config.method {
            Method::GET => {
                let mut req = RequestConfig::new();
                req.query = params;
                self.client
                    .request_json(reqwest::Method::GET, &self.config.path, req)
                    .await?
            }
            Method::POST => {
                let payload: Map<String, Value> = params
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                self.client
                    .request_json(
                        reqwest::Method::POST,
                        &self.config.path,
                        RequestConfig::new().json(Value::Object(payload)),
                    )
                    .await?
            }
        };

        self.parse_page(&body)
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// Resolve the array at `path`.
///
/// Plain dotted paths (`data`, `$.result.items`) must point at an array.
/// Anything else is evaluated as JSONPath: wildcard, recursive and filter
/// expressions yield their matches as the array, while a single-match path
/// such as `$.result['items']` must match exactly one array.
pub fn select_array(value: &Value, path: &str) -> Result<Option<Vec<Value>>> {
    if is_dotted(path) {
        return Ok(lookup(value, path).and_then(Value::as_array).cloned());
    }

    let jp = JsonPath::<Value>::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    let found = match jp.find(value) {
        Value::Array(found) => found,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    if is_multi_match(path) {
        return Ok(Some(found));
    }

    Ok(match found.as_slice() {
        [Value::Array(arr)] => Some(arr.clone()),
        _ => None,
    })
}

/// Check that `path` is something [`select_array`] can evaluate
pub fn validate_path(path: &str) -> Result<()> {
    if is_dotted(path) {
        return Ok(());
    }
    JsonPath::<Value>::try_from(path)
        .map(|_| ())
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))
}

fn is_dotted(path: &str) -> bool {
    !path.contains("..")
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '$'))
}

fn is_multi_match(path: &str) -> bool {
    path.contains('*') || path.contains("..") || path.contains("[?") || path.contains(':')
}

/// Resolve a dotted path such as `$.data.nextCursor` or `meta.total`
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Scalar JSON value as a string
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric or numeric-string JSON value as u64
pub fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
