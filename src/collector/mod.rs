//! Collector façade
//!
//! One method per resource kind, each building a [`RequestSpec`](crate::http::RequestSpec)
//! and handing it to the paginator. Records come back untouched in API order.

mod github;
mod types;

pub use github::GithubCollector;
pub use types::CollectRequest;
