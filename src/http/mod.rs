//! HTTP client module
//!
//! Provides the HTTP transport shared by all search sources.
//!
//! # Features
//!
//! - **Request Pacing**: Fixed inter-request delay using governor
//! - **Optional Retries**: Off by default, configurable per account
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
