//! Configuration types
//!
//! [`CollectorConfig`] is what the library consumes. [`Settings`] is the
//! file-backed layer the binary loads from YAML and then overrides from the
//! command line and environment.

use crate::auth::{AuthScheme, Credentials};
use crate::error::{Error, Result, ResultExt};
use crate::http::{ExecutorConfig, RetryConfig, DEFAULT_BASE_URL};
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Largest page size the API accepts
pub const MAX_PER_PAGE: u32 = 100;

// ============================================================================
// Collector Config
// ============================================================================

/// Configuration passed to [`GithubCollector::new`](crate::GithubCollector::new)
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Transport, authentication and retry settings
    pub executor: ExecutorConfig,
    /// Records requested per page (1..=100)
    pub per_page: u32,
    /// Page limit per collection call (`None` = unbounded)
    pub max_pages: Option<usize>,
    /// Ask for private repositories too (`type=all`)
    pub include_private: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            per_page: MAX_PER_PAGE,
            max_pages: None,
            include_private: false,
        }
    }
}

impl CollectorConfig {
    /// Create a new config builder
    pub fn builder() -> CollectorConfigBuilder {
        CollectorConfigBuilder::default()
    }
}

/// Builder for collector config
#[derive(Default)]
pub struct CollectorConfigBuilder {
    config: CollectorConfig,
}

impl CollectorConfigBuilder {
    /// Set the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.executor.base_url = url.into();
        self
    }

    /// Authenticate with a bearer token; `None` or blank means anonymous
    pub fn token(mut self, token: Option<impl Into<String>>) -> Self {
        self.config.executor.credentials = Credentials::from_token(token);
        self
    }

    /// Set credentials directly
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.executor.credentials = credentials;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.executor.timeout = timeout;
        self
    }

    /// Set retry behavior
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.executor.retry = retry;
        self
    }

    /// Space requests at least `interval` apart
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.config.executor.request_interval = Some(interval);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.executor.user_agent = agent.into();
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .executor
            .default_headers
            .insert(key.into(), value.into());
        self
    }

    /// Set the page size, clamped to 1..=100
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.config.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Limit the number of pages per collection call
    pub fn max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Include private repositories when listing a user's repos
    pub fn include_private(mut self, include: bool) -> Self {
        self.config.include_private = include;
        self
    }

    /// Build the config
    pub fn build(self) -> CollectorConfig {
        self.config
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Settings for the command-line tool, loaded from YAML
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Personal access token
    pub github_token: Option<String>,

    /// How the token is sent
    pub auth_scheme: AuthScheme,

    /// API base URL
    pub api_url: String,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Seconds between consecutive requests (0 disables pacing)
    pub rate_limit_delay: f64,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Directory exported files are written to
    pub output_dir: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Records per page
    pub per_page: u32,

    /// Page limit per collection call
    pub max_pages: Option<usize>,

    /// Include private repositories
    pub include_private: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: None,
            auth_scheme: AuthScheme::default(),
            api_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            rate_limit_delay: 0.5,
            request_timeout: 30,
            output_dir: PathBuf::from("output"),
            log_level: LogLevel::default(),
            per_page: MAX_PER_PAGE,
            max_pages: None,
            include_private: false,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        Duration::try_from_secs_f64(self.rate_limit_delay).map_err(|_| {
            Error::invalid_value(
                "rate_limit_delay",
                format!(
                    "must be a non-negative number of seconds, got {}",
                    self.rate_limit_delay
                ),
            )
        })?;
        if self.request_timeout == 0 {
            return Err(Error::invalid_value(
                "request_timeout",
                "must be at least 1 second",
            ));
        }
        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            return Err(Error::invalid_value(
                "per_page",
                format!("must be between 1 and {MAX_PER_PAGE}, got {}", self.per_page),
            ));
        }
        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("max_pages", "must be at least 1"));
        }
        Url::parse(&self.api_url)
            .map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        Ok(())
    }

    /// Pacing interval derived from `rate_limit_delay`
    pub fn request_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.rate_limit_delay)
            .ok()
            .filter(|interval| !interval.is_zero())
    }

    /// Build the library config
    pub fn to_collector_config(&self) -> Result<CollectorConfig> {
        self.validate()?;

        let credentials =
            Credentials::from_token(self.github_token.as_deref()).with_scheme(self.auth_scheme);
        let retry = RetryConfig::new().with_max_attempts(self.max_retries.saturating_add(1));

        let mut builder = CollectorConfig::builder()
            .base_url(&self.api_url)
            .credentials(credentials)
            .timeout(Duration::from_secs(self.request_timeout))
            .retry(retry)
            .per_page(self.per_page)
            .max_pages(self.max_pages)
            .include_private(self.include_private);

        if let Some(interval) = self.request_interval() {
            builder = builder.request_interval(interval);
        }

        Ok(builder.build())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "<redacted>"),
            )
            .field("auth_scheme", &self.auth_scheme)
            .field("api_url", &self.api_url)
            .field("max_retries", &self.max_retries)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("request_timeout", &self.request_timeout)
            .field("output_dir", &self.output_dir)
            .field("log_level", &self.log_level)
            .field("per_page", &self.per_page)
            .field("max_pages", &self.max_pages)
            .field("include_private", &self.include_private)
            .finish()
    }
}
