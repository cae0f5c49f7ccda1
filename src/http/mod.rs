//! HTTP executor module
//!
//! Issues GitHub API requests with rate-limit tracking and retry.
//!
//! # Features
//!
//! - **Rate Governor**: waits for the `x-ratelimit-reset` window when the budget is spent
//! - **Request Pacing**: optional fixed interval between requests (governor crate)
//! - **Retry Policy**: exponential backoff with jitter for 429, 5xx and transport errors
//! - **Authentication**: bearer or `token` scheme personal access tokens

mod client;
mod rate_limit;
mod request;
mod retry;

pub use client::{
    ExecutorConfig, ExecutorConfigBuilder, ExecutorStats, RequestExecutor, API_VERSION,
    DEFAULT_BASE_URL,
};
pub use rate_limit::{
    RateGovernor, RateState, RequestPacer, LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER,
};
pub use request::RequestSpec;
pub use retry::{
    is_rate_limited, retry_after, should_retry, Classification, RetryConfig, RetryContext,
    RetryPolicy,
};

#[cfg(test)]
mod tests;
