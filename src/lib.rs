//! # GitHub Collector
//!
//! A rate-limit aware, paginating collector for the GitHub REST API.
//!
//! ## Features
//!
//! - **Rate Governor**: tracks the `x-ratelimit-*` budget and waits for the reset
//!   instead of burning requests against an exhausted quota
//! - **Retry Policy**: exponential backoff with jitter for 429, 5xx and transport errors
//! - **Pagination**: follows `Link: rel="next"` headers or embedded cursors, strictly in order
//! - **Cancellation**: every wait and in-flight request can be cancelled cooperatively
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use github_collector::{CollectorConfig, GithubCollector, IssueState, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = CollectorConfig::builder()
//!         .token(std::env::var("GITHUB_TOKEN").ok())
//!         .build();
//!     let collector = GithubCollector::new(config)?;
//!
//!     let issues = collector
//!         .collect_repo_issues("rust-lang", "rust", IssueState::Open)
//!         .await?;
//!     println!("{} issues", issues.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       GithubCollector                         │
//! │  user_repos   repo_issues   pull_requests   user_profile      │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 │
//!                         ┌───────┴───────┐
//!                         │   Paginator   │  Link header / embedded cursor
//!                         └───────┬───────┘
//!                                 │
//!                      ┌──────────┴──────────┐
//!                      │  RequestExecutor    │  auth, classification
//!                      └─────┬─────────┬─────┘
//!                            │         │
//!                  ┌─────────┴──┐  ┌───┴──────────┐
//!                  │RateGovernor│  │ RetryPolicy  │
//!                  └────────────┘  └──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the collector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Cooperative cancellation
pub mod cancel;

/// Token authentication
pub mod auth;

/// HTTP executor with rate limiting and retry
pub mod http;

/// Page assembly over cursor-based endpoints
pub mod pagination;

/// Resource-specific collection methods
pub mod collector;

/// Library and binary configuration
pub mod config;

/// JSON export of collected records
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use cancel::CancelToken;
pub use collector::{CollectRequest, GithubCollector};
pub use config::{CollectorConfig, Settings};
pub use error::{Error, Result};
pub use pagination::ResourceSet;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
