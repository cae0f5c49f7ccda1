//! Retry classification and exponential backoff
//!
//! Decides, per response or transport error, whether a request succeeded,
//! may be retried, or must fail immediately, and how long to back off
//! between attempts.

use super::rate_limit::REMAINING_HEADER;
use crate::error::Error;
use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Randomise delays by a factor in [0.5, 1.5)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a retry config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts (at least one)
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base delay
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay cap
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Outcome of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 2xx
    Success,
    /// Transport errors, 429, 5xx, rate-limited 403
    RetryableFailure,
    /// Everything else
    FatalFailure,
}

/// Per-request retry decisions
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from config
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// The underlying config
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Maximum number of attempts
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Classify a completed request or a transport error
    pub fn classify(
        &self,
        outcome: &std::result::Result<reqwest::Response, reqwest::Error>,
    ) -> Classification {
        match outcome {
            Ok(response) => self.classify_status(response.status(), response.headers()),
            Err(error) => self.classify_transport(error),
        }
    }

    /// Classify an HTTP status
    pub fn classify_status(&self, status: StatusCode, headers: &HeaderMap) -> Classification {
        if status.is_success() {
            Classification::Success
        } else if status.is_server_error() || is_rate_limited(status, headers) {
            Classification::RetryableFailure
        } else {
            Classification::FatalFailure
        }
    }

    /// Classify a transport-level error.
    ///
    /// Failures to even build the request (bad URL, bad header) are permanent.
    pub fn classify_transport(&self, error: &reqwest::Error) -> Classification {
        if error.is_builder() {
            Classification::FatalFailure
        } else {
            Classification::RetryableFailure
        }
    }

    /// Backoff before retrying after failed attempt `attempt` (1-based):
    /// `base * 2^(attempt-1)`, capped at `max_delay`
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 2u32.saturating_pow(exponent);
        let delay = self
            .config
            .base_delay
            .checked_mul(factor)
            .unwrap_or(self.config.max_delay);
        let capped = delay.min(self.config.max_delay);

        if self.config.jitter {
            let jitter_factor = rand::rng().random_range(0.5..1.5);
            capped.mul_f64(jitter_factor).min(self.config.max_delay)
        } else {
            capped
        }
    }

    /// Backoff honoring a server `Retry-After` hint as a lower bound
    pub fn retry_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = self.next_delay(attempt);
        match retry_after {
            Some(hint) => delay.max(hint).min(self.config.max_delay),
            None => delay,
        }
    }

    /// Whether another attempt is allowed after `attempt`
    pub fn should_retry(&self, attempt: u32) -> bool {
        should_retry(attempt, self.config.max_attempts)
    }
}

/// `attempt < max_attempts`
pub fn should_retry(attempt: u32, max_attempts: u32) -> bool {
    attempt < max_attempts
}

/// 429, or GitHub's 403 with an exhausted budget
pub fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && headers
                .get(REMAINING_HEADER)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim() == "0"))
}

/// `Retry-After` in seconds
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// State of one logical request across its attempts
#[derive(Debug)]
pub struct RetryContext {
    /// Current attempt, starting at 1
    pub attempt: u32,
    /// Attempts allowed
    pub max_attempts: u32,
    /// Failure of the previous attempt
    pub last_error: Option<Error>,
}

impl RetryContext {
    /// Fresh context at attempt 1
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 1,
            max_attempts,
            last_error: None,
        }
    }

    /// Whether another attempt is allowed
    pub fn should_retry(&self) -> bool {
        should_retry(self.attempt, self.max_attempts)
    }

    /// Record a failure and move to the next attempt
    pub fn advance(&mut self, error: Error) {
        self.last_error = Some(error);
        self.attempt += 1;
    }
}
