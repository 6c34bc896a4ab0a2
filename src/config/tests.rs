//! Tests for account configuration

use super::*;
use crate::auth::AuthConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;

const ACCOUNTS: &str = r#"
default_account: amazon-eu
accounts:
  amazon-eu:
    description: EU catalog
    source:
      kind: amazon_catalog
      base_url: https://sellingpartnerapi-eu.amazon.com
      marketplace_ids: [A1PA6795UKMFR9]
    auth:
      type: oauth2_refresh
      token_url: https://api.amazon.com/auth/o2/token
      client_id: "{{ env.LWA_CLIENT_ID }}"
      client_secret: "{{ env.LWA_CLIENT_SECRET }}"
      refresh_token: "{{ env.LWA_REFRESH_TOKEN }}"
      token_header: x-amz-access-token
    http:
      request_delay_ms: 250
    search:
      max_depth: 1
      facets: [classifications, brands]
  netsuite:
    source:
      kind: json
      base_url: "https://{{ env.NS_ACCOUNT }}.suitetalk.api.netsuite.com"
      endpoint:
        path: /services/rest/query/v1/suiteql
        method: POST
        items_path: items
        next_token_path: links.1.href
    auth:
      type: bearer
      token: "{{ env.NS_TOKEN }}"
    search:
      max_depth: 0
      page_size: 100
"#;

fn ctx() -> TemplateContext {
    let mut ctx = TemplateContext::new();
    ctx.set_env(json!({
        "LWA_CLIENT_ID": "amzn1.application-oa2-client.abc",
        "LWA_CLIENT_SECRET": "secret",
        "LWA_REFRESH_TOKEN": "Atzr|token"
    }));
    ctx
}

#[test]
fn test_load_accounts_from_str() {
    let file = load_accounts_from_str(ACCOUNTS).unwrap();

    assert_eq!(file.default_account.as_deref(), Some("amazon-eu"));
    assert_eq!(file.names().collect::<Vec<_>>(), vec!["amazon-eu", "netsuite"]);
}

#[test]
fn test_resolve_amazon_account() {
    let file = load_accounts_from_str(ACCOUNTS).unwrap();
    let account = file.resolve("amazon-eu", &ctx()).unwrap();

    assert_eq!(account.description.as_deref(), Some("EU catalog"));
    assert_eq!(
        account.source,
        SourceConfig::AmazonCatalog {
            base_url: "https://sellingpartnerapi-eu.amazon.com".to_string(),
            marketplace_ids: vec!["A1PA6795UKMFR9".to_string()],
            locale: None,
        }
    );
    match &account.auth {
        AuthConfig::Oauth2Refresh {
            client_id,
            refresh_token,
            token_header,
            ..
        } => {
            assert_eq!(client_id, "amzn1.application-oa2-client.abc");
            assert_eq!(refresh_token, "Atzr|token");
            assert_eq!(token_header.as_deref(), Some("x-amz-access-token"));
        }
        other => panic!("Expected Oauth2Refresh, got {other:?}"),
    }

    assert_eq!(account.http.request_delay_ms, 250);
    assert_eq!(account.http.timeout_secs, 30);
    assert_eq!(account.http.max_retries, 0);
    assert_eq!(account.search.max_depth, 1);
    assert_eq!(account.search.ceiling, 1000);
    assert_eq!(account.search.page_size, 20);
    assert_eq!(account.search.facets, vec!["classifications", "brands"]);
}

#[test]
fn test_unused_account_templates_are_not_rendered() {
    let file = load_accounts_from_str(ACCOUNTS).unwrap();

    // NS_ACCOUNT / NS_TOKEN are unset
    assert!(file.resolve("amazon-eu", &ctx()).is_ok());
    let err = file.resolve("netsuite", &ctx()).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_resolve_json_account() {
    let file = load_accounts_from_str(ACCOUNTS).unwrap();
    let mut ctx = ctx();
    ctx.set_env(json!({"NS_ACCOUNT": "1234567", "NS_TOKEN": "tok"}));

    let account = file.resolve("netsuite", &ctx).unwrap();

    assert_eq!(
        account.source.base_url(),
        "https://1234567.suitetalk.api.netsuite.com"
    );
    assert_eq!(account.source.kind(), "json");
    assert_eq!(account.source.max_page_size(), 250);
    assert_eq!(account.search.page_size, 100);
}

#[test]
fn test_select_account() {
    let file = load_accounts_from_str(ACCOUNTS).unwrap();

    assert_eq!(file.select(None).unwrap(), "amazon-eu");
    assert_eq!(file.select(Some("netsuite")).unwrap(), "netsuite");

    let err = file.select(Some("shopify")).unwrap_err();
    assert!(err.to_string().contains("Available: amazon-eu, netsuite"));
}

#[test]
fn test_select_single_account_without_default() {
    let yaml = r"
accounts:
  only:
    source:
      kind: amazon_catalog
      base_url: https://sellingpartnerapi-na.amazon.com
      marketplace_ids: [ATVPDKIKX0DER]
";
    let file = load_accounts_from_str(yaml).unwrap();
    assert_eq!(file.select(None).unwrap(), "only");
}

#[test]
fn test_unknown_default_account_rejected() {
    let yaml = r"
default_account: missing
accounts:
  only:
    source: {kind: amazon_catalog, base_url: 'https://x', marketplace_ids: [A]}
";
    let err = load_accounts_from_str(yaml).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

#[test]
fn test_empty_accounts_rejected() {
    let err = load_accounts_from_str("accounts: {}").unwrap_err();
    assert!(err.to_string().contains("no accounts"));
}

fn account(source: Value, search: Value) -> Result<AccountConfig> {
    let file = AccountsFile {
        default_account: None,
        accounts: [(
            "test".to_string(),
            json!({"source": source, "search": search}),
        )]
        .into_iter()
        .collect(),
    };
    file.resolve("test", &TemplateContext::new())
}

#[test]
fn test_validation_rejects_bad_values() {
    let amazon = json!({
        "kind": "amazon_catalog",
        "base_url": "https://sellingpartnerapi-eu.amazon.com",
        "marketplace_ids": ["A1PA6795UKMFR9"]
    });

    assert!(account(amazon.clone(), json!({})).is_ok());

    let err = account(amazon.clone(), json!({"page_size": 0})).unwrap_err();
    assert!(err.to_string().contains("search.page_size"));

    let err = account(amazon.clone(), json!({"page_size": 50})).unwrap_err();
    assert!(err.to_string().contains("endpoint maximum of 20"));

    let err = account(amazon.clone(), json!({"ceiling": 0})).unwrap_err();
    assert!(err.to_string().contains("search.ceiling"));

    let err = account(amazon.clone(), json!({"branch_concurrency": 0})).unwrap_err();
    assert!(err.to_string().contains("branch_concurrency"));

    let err = account(amazon, json!({"facets": []})).unwrap_err();
    assert!(err.to_string().contains("search.facets"));

    let err = account(
        json!({"kind": "amazon_catalog", "base_url": "", "marketplace_ids": ["A"]}),
        json!({}),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));

    let err = account(
        json!({"kind": "amazon_catalog", "base_url": "not a url", "marketplace_ids": ["A"]}),
        json!({}),
    )
    .unwrap_err();
    assert!(err.to_string().contains("source.base_url"));

    let err = account(
        json!({"kind": "amazon_catalog", "base_url": "https://x", "marketplace_ids": []}),
        json!({}),
    )
    .unwrap_err();
    assert!(err.to_string().contains("marketplace_ids"));
}

#[test]
fn test_validation_checks_json_paths() {
    let source = |items_path: &str| {
        json!({
            "kind": "json",
            "base_url": "https://api.example.com",
            "endpoint": {"path": "/search", "items_path": items_path}
        })
    };
    let search = json!({"max_depth": 0});

    assert!(account(source("data"), search.clone()).is_ok());
    assert!(account(source("$.data[*]"), search.clone()).is_ok());
    assert!(account(source("$.result['items']"), search.clone()).is_ok());

    let err = account(source("$.data[*"), search).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
    assert!(err.to_string().contains("source.endpoint.items_path"));
}

#[test]
fn test_http_settings_client_config() {
    let settings = HttpSettings {
        request_delay_ms: 0,
        user_agent: Some("catalog-audit/2.0".to_string()),
        ..HttpSettings::default()
    };
    let config = settings.client_config("https://sellingpartnerapi-fe.amazon.com");

    assert_eq!(
        config.base_url.as_deref(),
        Some("https://sellingpartnerapi-fe.amazon.com")
    );
    assert!(config.rate_limit.is_none());
    assert_eq!(config.user_agent, "catalog-audit/2.0");
    assert_eq!(config.timeout, Duration::from_secs(30));
}

#[test]
fn test_load_accounts_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(ACCOUNTS.as_bytes()).unwrap();

    let accounts = load_accounts(file.path()).unwrap();
    assert_eq!(accounts.accounts.len(), 2);

    let err = load_accounts("/nonexistent/accounts.yaml").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}
