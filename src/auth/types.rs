//! Auth configuration types
//!
//! These types represent the runtime auth configuration after template
//! interpolation has been applied to the accounts file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in HTTP header
    #[default]
    Header,
    /// Place in query parameter
    Query,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// API Key authentication (header or query)
    ApiKey {
        /// Where to place the API key
        #[serde(default)]
        location: Location,
        /// Header name (for header location)
        #[serde(default)]
        header_name: Option<String>,
        /// Query parameter name (for query location)
        #[serde(default)]
        query_param: Option<String>,
        /// Prefix to add before the value (e.g., "Bearer ")
        #[serde(default)]
        prefix: Option<String>,
        /// The API key value
        value: String,
    },

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 Client Credentials flow
    Oauth2ClientCredentials {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Requested scopes
        #[serde(default)]
        scopes: Vec<String>,
        /// Header carrying the access token (defaults to `Authorization: Bearer`)
        #[serde(default)]
        token_header: Option<String>,
    },

    /// OAuth2 Refresh Token flow (Login with Amazon for SP-API)
    Oauth2Refresh {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Refresh token
        refresh_token: String,
        /// Header carrying the access token, e.g. `x-amz-access-token`
        #[serde(default)]
        token_header: Option<String>,
    },

    /// Custom headers
    CustomHeaders {
        /// Headers to add to each request
        headers: HashMap<String, String>,
    },
}

impl AuthConfig {
    /// Whether this auth type exchanges credentials for a cached token
    pub fn needs_token(&self) -> bool {
        matches!(
            self,
            Self::Oauth2ClientCredentials { .. } | Self::Oauth2Refresh { .. }
        )
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
