// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limited HTTP fetcher.
//!
//! Every request acquires a slot from a shared semaphore, holds it for exactly
//! one attempt, and releases it before any backoff sleep. A backlog of plugin
//! tasks therefore never has more than `concurrency` requests in flight, and a
//! retrying task lets others interleave while it waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use mcdr_catalog_core::CatalogError;
use reqwest::StatusCode;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use secrecy::ExposeSecret;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::client::ClientConfig;

/// Counters describing a fetcher's lifetime activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub retries: u64,
    pub peak_in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    retries: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Decrements the in-flight count even if the attempt future is dropped.
struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Outcome of a single attempt.
enum Attempt {
    Done(String),
    Transient(String),
    Fatal(CatalogError),
}

/// Bounded-concurrency fetcher shared by every plugin task.
///
/// Cloning is cheap; clones share the slot pool and counters.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    slots: Arc<Semaphore>,
    capacity: usize,
    auth_header: Option<HeaderValue>,
    config: Arc<ClientConfig>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("capacity", &self.capacity)
            .field("available", &self.slots.available_permits())
            .field("authorized", &self.auth_header.is_some())
            .finish()
    }
}

impl Fetcher {
    /// Builds the HTTP client and slot pool from an explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, CatalogError> {
        let auth_header = match &config.token {
            Some(token) => {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(
                        |e| CatalogError::FatalConfig(format!("invalid token header value: {e}")),
                    )?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Internal(format!("failed to build HTTP client: {e}")))?;

        let capacity = config.concurrency.max(1);
        Ok(Self {
            client,
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
            auth_header,
            config: Arc::new(config),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Maximum number of requests in flight.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held by an attempt.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> FetchStats {
        let c = &self.counters;
        FetchStats {
            attempts: c.attempts.load(Ordering::SeqCst),
            successes: c.successes.load(Ordering::SeqCst),
            failures: c.failures.load(Ordering::SeqCst),
            retries: c.retries.load(Ordering::SeqCst),
            peak_in_flight: c.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Fetches `url` as text, retrying transient failures up to `max_retries` times.
    ///
    /// Transient failures are timeouts, connection errors, 408, 429, and 5xx.
    /// Any other non-success status fails immediately with `CatalogError::Status`.
    pub async fn fetch(&self, url: &str, max_retries: u32) -> Result<String, CatalogError> {
        let mut last_error = String::new();

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = self.config.backoff_delay(attempt);
                self.counters.retries.fetch_add(1, Ordering::SeqCst);
                warn!(url, attempt, delay_ms = delay.as_millis() as u64, "retrying after transient error");
                tokio::time::sleep(delay).await;
            }

            match self.attempt(url).await {
                Attempt::Done(body) => {
                    self.counters.successes.fetch_add(1, Ordering::SeqCst);
                    debug!(url, attempt, bytes = body.len(), "fetch succeeded");
                    return Ok(body);
                }
                Attempt::Transient(message) => {
                    warn!(url, attempt, error = %message, "transient fetch failure");
                    last_error = message;
                }
                Attempt::Fatal(err) => {
                    self.counters.failures.fetch_add(1, Ordering::SeqCst);
                    warn!(url, attempt, error = %err, "fetch failed");
                    return Err(err);
                }
            }
        }

        self.counters.failures.fetch_add(1, Ordering::SeqCst);
        warn!(url, attempts = max_retries + 1, "fetch gave up after retries");
        Err(CatalogError::TransientFetch {
            url: url.to_string(),
            attempts: max_retries + 1,
            message: last_error,
        })
    }

    /// One request under one slot. The permit is released when this returns.
    async fn attempt(&self, url: &str) -> Attempt {
        let _permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Attempt::Fatal(CatalogError::Internal("fetch slot pool closed".into())),
        };
        let _in_flight = InFlight::enter(&self.counters);
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);

        let mut request = self.client.get(url);
        if let Some(auth) = &self.auth_header
            && self.is_authorized(url)
        {
            request = request.header(AUTHORIZATION, auth.clone());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Attempt::Fatal(CatalogError::Internal(format!("invalid request for {url}: {e}")));
            }
            Err(e) => return Attempt::Transient(format!("request failed: {e}")),
        };

        let status = response.status();
        if status.is_success() {
            return match response.text().await {
                Ok(body) => Attempt::Done(body),
                Err(e) => Attempt::Transient(format!("failed to read body: {e}")),
            };
        }

        if is_transient_status(status) {
            Attempt::Transient(format!("HTTP {status}"))
        } else {
            Attempt::Fatal(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }

    fn is_authorized(&self, url: &str) -> bool {
        reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .is_some_and(|host| self.config.authorized_hosts.iter().any(|h| *h == host))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher(concurrency: usize, token: Option<&str>) -> Fetcher {
        Fetcher::new(ClientConfig {
            token: token.map(|t| t.to_string().into()),
            authorized_hosts: vec!["127.0.0.1".into()],
            user_agent: "test-agent".into(),
            timeout: Duration::from_secs(2),
            concurrency,
            backoff_base: Duration::from_millis(1),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(2, None);
        let body = fetcher.fetch(&format!("{}/ok", server.uri()), 0).await.unwrap();
        assert_eq!(body, "hello");
        assert_eq!(fetcher.stats().attempts, 1);
    }

    #[tokio::test]
    async fn fetch_retries_twice_then_succeeds_without_leaking_slots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(1, None);
        let body = fetcher
            .fetch(&format!("{}/flaky", server.uri()), 3)
            .await
            .unwrap();

        assert_eq!(body, "finally");
        let stats = fetcher.stats();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.retries, 2);
        assert_eq!(stats.peak_in_flight, 1);
        assert_eq!(fetcher.available_slots(), fetcher.capacity());
    }

    #[tokio::test]
    async fn fetch_exhausts_retries_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(2, None);
        let err = fetcher
            .fetch(&format!("{}/down", server.uri()), 2)
            .await
            .unwrap_err();
        assert!(err.is_transient(), "got: {err}");
        assert!(matches!(err, CatalogError::TransientFetch { attempts: 3, .. }));
        assert_eq!(fetcher.available_slots(), 2);
    }

    #[tokio::test]
    async fn fetch_does_not_retry_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = test_fetcher(2, None);
        let err = fetcher
            .fetch(&format!("{}/missing", server.uri()), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn timeout_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(ClientConfig {
            timeout: Duration::from_millis(50),
            ..test_fetcher(1, None).config.as_ref().clone()
        })
        .unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow", server.uri()), 1)
            .await
            .unwrap_err();
        assert!(err.is_transient(), "got: {err}");
    }

    #[tokio::test]
    async fn in_flight_never_exceeds_capacity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(30)))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(3, None);
        let calls = (0..12).map(|i| {
            let fetcher = fetcher.clone();
            let url = format!("{}/p{i}", server.uri());
            async move { fetcher.fetch(&url, 0).await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(Result::is_ok));
        let stats = fetcher.stats();
        assert!(stats.peak_in_flight <= 3, "peak was {}", stats.peak_in_flight);
        assert_eq!(stats.attempts, 12);
        assert_eq!(fetcher.available_slots(), 3);
    }

    #[tokio::test]
    async fn token_sent_only_to_authorized_hosts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(header("authorization", "Bearer ghp_secret"))
            .and(header("user-agent", "test-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("authorized"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher(1, Some("ghp_secret"));
        let body = fetcher
            .fetch(&format!("{}/api", server.uri()), 0)
            .await
            .unwrap();
        assert_eq!(body, "authorized");

        let unauthorized = Fetcher::new(ClientConfig {
            authorized_hosts: vec!["api.github.com".into()],
            ..fetcher.config.as_ref().clone()
        })
        .unwrap();
        Mock::given(method("GET"))
            .and(path("/cdn"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdn"))
            .respond_with(ResponseTemplate::new(200).set_body_string("anonymous"))
            .mount(&server)
            .await;
        let body = unauthorized
            .fetch(&format!("{}/cdn", server.uri()), 0)
            .await
            .unwrap();
        assert_eq!(body, "anonymous");
    }
}
