//! Authentication module
//!
//! Supports: API Key, Basic, Bearer, OAuth2 (client credentials and refresh
//! token, e.g. Login with Amazon), Custom Headers
//!
//! The `Authenticator` handles all auth types and caches access tokens for
//! the OAuth2 flows. One authenticator is shared by every partition branch
//! of a collection, so a token is refreshed at most once per expiry.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken, Location};
