//! HTTP request executor with retry and rate limiting
//!
//! Issues single authenticated requests and handles:
//! - Waiting on the rate governor before every attempt
//! - Retries with exponential backoff for transient failures
//! - Error classification (auth, not found, exhausted retries)
//! - Turning a successful response into a [`Page`]

use super::rate_limit::{RateGovernor, RateState};
use super::request::RequestSpec;
use super::retry::{
    is_rate_limited, retry_after, Classification, RetryConfig, RetryContext, RetryPolicy,
};
use crate::auth::Credentials;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::pagination::{Page, PageSource};
use crate::types::{JsonValue, StringMap};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Public GitHub REST API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// REST API version sent with every request
pub const API_VERSION: &str = "2022-11-28";

/// Configuration for the request executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base URL for relative request paths
    pub base_url: String,
    /// Token used for every request
    pub credentials: Credentials,
    /// Request timeout
    pub timeout: Duration,
    /// Retry behavior
    pub retry: RetryConfig,
    /// Minimum spacing between requests
    pub request_interval: Option<Duration>,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// User agent string (GitHub rejects requests without one)
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::Anonymous,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            request_interval: None,
            default_headers: StringMap::new(),
            user_agent: format!("github-collector/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ExecutorConfig {
    /// Create a new config builder
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }
}

/// Builder for executor config
#[derive(Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set credentials
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set retry behavior
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Space requests at least `interval` apart
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.config.request_interval = Some(interval);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}

/// Counters kept across all requests of one executor
#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    retries: AtomicU64,
    rate_limit_waits: AtomicU64,
}

/// Snapshot of executor activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Requests put on the wire, retries included
    pub requests: u64,
    /// Backoff delays taken before a retry
    pub retries: u64,
    /// Times a request waited for the rate-limit window to reset
    pub rate_limit_waits: u64,
}

/// Result of one attempt
enum Attempt {
    Done(Result<Page>),
    Retry {
        error: Error,
        retry_after: Option<Duration>,
    },
}

/// Executes requests with authentication, rate limiting and retry
pub struct RequestExecutor {
    client: Client,
    config: ExecutorConfig,
    base_url: Url,
    governor: RateGovernor,
    policy: RetryPolicy,
    counters: Arc<Counters>,
}

impl RequestExecutor {
    /// Create an executor with its own rate governor
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        let governor = match config.request_interval {
            Some(interval) => RateGovernor::new().with_pacing(interval),
            None => RateGovernor::new(),
        };
        Self::with_governor(config, governor)
    }

    /// Create an executor drawing on a shared rate governor
    pub fn with_governor(config: ExecutorConfig, governor: RateGovernor) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;
        let policy = RetryPolicy::new(config.retry.clone());

        Ok(Self {
            client,
            config,
            base_url,
            governor,
            policy,
            counters: Arc::new(Counters::default()),
        })
    }

    /// The rate governor used by this executor
    pub fn governor(&self) -> &RateGovernor {
        &self.governor
    }

    /// The retry policy used by this executor
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Activity counters
    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            retries: self.counters.retries.load(Ordering::Relaxed),
            rate_limit_waits: self.counters.rate_limit_waits.load(Ordering::Relaxed),
        }
    }

    /// Execute one logical request, retrying transient failures
    pub async fn execute(&self, spec: &RequestSpec, cancel: &CancelToken) -> Result<Page> {
        let url = self.build_url(&spec.path)?;
        let mut ctx = RetryContext::new(self.policy.max_attempts());

        loop {
            cancel.check()?;

            let waited = self.governor.acquire(cancel).await?;
            if !waited.is_zero() {
                self.counters.rate_limit_waits.fetch_add(1, Ordering::Relaxed);
            }

            match self.attempt(spec, &url, cancel).await? {
                Attempt::Done(result) => return result,
                Attempt::Retry { error, retry_after } => {
                    if !ctx.should_retry() {
                        warn!(
                            "All {} attempts exhausted for {} {}: {}",
                            ctx.max_attempts, spec.method, spec.path, error
                        );
                        return Err(error);
                    }

                    let delay = self.policy.retry_delay(ctx.attempt, retry_after);
                    warn!(
                        "Attempt {}/{} for {} {} failed: {}. Retrying in {:?}",
                        ctx.attempt, ctx.max_attempts, spec.method, spec.path, error, delay
                    );
                    self.counters.retries.fetch_add(1, Ordering::Relaxed);
                    ctx.advance(error);
                    cancel.sleep(delay).await?;
                }
            }
        }
    }

    /// Send once and classify. Only cancellation escapes as `Err`.
    async fn attempt(&self, spec: &RequestSpec, url: &Url, cancel: &CancelToken) -> Result<Attempt> {
        let method = spec.method.to_string();
        debug!("Sending {} {}", method, url);
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        let sent = cancel.run(self.build_request(spec, url).send()).await?;
        let classification = self.policy.classify(&sent);

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                let error = Error::network(&method, &spec.path, e.to_string());
                return Ok(match classification {
                    Classification::RetryableFailure => Attempt::Retry {
                        error,
                        retry_after: None,
                    },
                    _ => Attempt::Done(Err(error)),
                });
            }
        };

        self.governor.observe(response.headers()).await;

        let status = response.status();
        let headers = response.headers().clone();
        match classification {
            Classification::Success => self.read_page(spec, response, cancel).await,
            Classification::FatalFailure => {
                let body = cancel.run(response.text()).await?.unwrap_or_default();
                Ok(Attempt::Done(Err(Error::from_status(
                    &method,
                    &spec.path,
                    status.as_u16(),
                    &body,
                ))))
            }
            Classification::RetryableFailure => {
                let error = if is_rate_limited(status, &headers) {
                    let reset_at = RateState::from_headers(&headers).map(|s| s.reset_at);
                    Error::rate_limited(&method, &spec.path, reset_at)
                } else {
                    let body = cancel.run(response.text()).await?.unwrap_or_default();
                    Error::from_status(&method, &spec.path, status.as_u16(), &body)
                };
                Ok(Attempt::Retry {
                    error,
                    retry_after: retry_after(&headers),
                })
            }
        }
    }

    /// Read a successful body. A body cut off mid-transfer is retryable.
    async fn read_page(
        &self,
        spec: &RequestSpec,
        response: Response,
        cancel: &CancelToken,
    ) -> Result<Attempt> {
        let headers = response.headers().clone();
        let bytes = match cancel.run(response.bytes()).await? {
            Ok(bytes) => bytes,
            Err(e) => {
                return Ok(Attempt::Retry {
                    error: Error::network(spec.method.to_string(), &spec.path, e.to_string()),
                    retry_after: None,
                })
            }
        };

        let body: JsonValue = if bytes.is_empty() {
            JsonValue::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => body,
                Err(e) => return Ok(Attempt::Done(Err(Error::decode(&spec.path, e.to_string())))),
            }
        };

        Ok(Attempt::Done(Page::from_response(
            body,
            &headers,
            &spec.layout,
            &spec.path,
        )))
    }

    fn build_request(&self, spec: &RequestSpec, url: &Url) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(spec.method.into(), url.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        for (key, value) in &spec.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !spec.query.is_empty() {
            req = req.query(&spec.query);
        }

        self.config.credentials.apply(req)
    }

    /// Build full URL from path.
    ///
    /// Absolute URLs (next-page links) must share the base URL's origin;
    /// credentials are never sent anywhere else.
    fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let url = Url::parse(path)?;
            if url.origin() != self.base_url.origin() {
                return Err(Error::decode(
                    path,
                    format!(
                        "URL is outside the API origin {}",
                        self.base_url.origin().ascii_serialization()
                    ),
                ));
            }
            return Ok(url);
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

#[async_trait]
impl PageSource for RequestExecutor {
    async fn fetch_page(&self, spec: &RequestSpec, cancel: &CancelToken) -> Result<Page> {
        self.execute(spec, cancel).await
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .field("governor", &self.governor)
            .finish_non_exhaustive()
    }
}
