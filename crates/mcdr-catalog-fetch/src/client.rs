// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit client configuration handed to the [`Fetcher`](crate::Fetcher).

use std::time::Duration;

use mcdr_catalog_config::CatalogConfig;
use secrecy::SecretString;

/// Upper bound on a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Everything the fetcher needs to build its HTTP client and slot pool.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token, attached only to requests for `authorized_hosts`.
    pub token: Option<SecretString>,
    /// Hosts that receive the bearer token.
    pub authorized_hosts: Vec<String>,
    /// User-Agent header for every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum number of requests in flight.
    pub concurrency: usize,
    /// First retry delay; each later retry doubles it.
    pub backoff_base: Duration,
}

impl ClientConfig {
    /// Derives the client configuration from the loaded config and a resolved token.
    ///
    /// Only the repository-content API host is authorized.
    pub fn from_config(config: &CatalogConfig, token: Option<SecretString>) -> Self {
        let authorized_hosts = reqwest::Url::parse(&config.github.api_base)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .into_iter()
            .collect();
        Self {
            token,
            authorized_hosts,
            user_agent: config.fetch.user_agent.clone(),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            concurrency: config.fetch.concurrency.max(1),
            backoff_base: Duration::from_millis(config.fetch.backoff_base_ms),
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default(), None)
    }
}
