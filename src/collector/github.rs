//! GitHub resource collector
//!
//! Thin compositions of request construction and pagination, one per
//! resource kind.

use super::types::CollectRequest;
use crate::cancel::CancelToken;
use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use crate::http::{ExecutorStats, RateGovernor, RequestExecutor, RequestSpec};
use crate::pagination::{Paginator, ResourceSet};
use crate::types::IssueState;
use std::sync::Arc;
use tracing::info;

/// Collects repositories, issues, pull requests and profiles.
///
/// Clones share the executor, and with it the rate-limit budget, so parallel
/// calls on clones are throttled together.
#[derive(Debug, Clone)]
pub struct GithubCollector {
    executor: Arc<RequestExecutor>,
    config: Arc<CollectorConfig>,
    cancel: CancelToken,
}

impl GithubCollector {
    /// Create a collector with a fresh rate governor
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let executor = RequestExecutor::new(config.executor.clone())?;
        Ok(Self::from_parts(executor, config))
    }

    /// Create a collector drawing on an existing rate governor
    pub fn with_governor(config: CollectorConfig, governor: RateGovernor) -> Result<Self> {
        let executor = RequestExecutor::with_governor(config.executor.clone(), governor)?;
        Ok(Self::from_parts(executor, config))
    }

    fn from_parts(executor: RequestExecutor, config: CollectorConfig) -> Self {
        Self {
            executor: Arc::new(executor),
            config: Arc::new(config),
            cancel: CancelToken::new(),
        }
    }

    /// Use `cancel` for every subsequent call
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this collector's calls
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Shared rate governor
    pub fn governor(&self) -> &RateGovernor {
        self.executor.governor()
    }

    /// Collector configuration
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Request counters
    pub fn stats(&self) -> ExecutorStats {
        self.executor.stats()
    }

    /// All repositories of `username`, most recently updated first
    pub async fn collect_user_repos(&self, username: &str) -> Result<ResourceSet> {
        require("username", username)?;
        info!(username, "Collecting repositories");

        let repo_type = if self.config.include_private {
            "all"
        } else {
            "public"
        };
        let spec = RequestSpec::get_segments(&["users", username, "repos"])
            .query("per_page", self.config.per_page)
            .query("sort", "updated")
            .query("direction", "desc")
            .query("type", repo_type);

        let repos = self.paginate(&spec).await?;
        info!(username, count = repos.len(), "Collected repositories");
        Ok(repos)
    }

    /// Issues of `owner/repo` in the given state.
    ///
    /// The issues endpoint also returns pull requests (records carrying a
    /// `pull_request` key). They are passed through unchanged; separating
    /// them is up to whoever consumes the records.
    pub async fn collect_repo_issues(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
    ) -> Result<ResourceSet> {
        require("owner", owner)?;
        require("repo", repo)?;
        info!(owner, repo, %state, "Collecting issues");

        let spec = RequestSpec::get_segments(&["repos", owner, repo, "issues"])
            .query("state", state)
            .query("per_page", self.config.per_page);

        let issues = self.paginate(&spec).await?;
        info!(owner, repo, count = issues.len(), "Collected issues");
        Ok(issues)
    }

    /// Pull requests of `owner/repo` in the given state
    pub async fn collect_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
    ) -> Result<ResourceSet> {
        require("owner", owner)?;
        require("repo", repo)?;
        info!(owner, repo, %state, "Collecting pull requests");

        let spec = RequestSpec::get_segments(&["repos", owner, repo, "pulls"])
            .query("state", state)
            .query("per_page", self.config.per_page);

        let prs = self.paginate(&spec).await?;
        info!(owner, repo, count = prs.len(), "Collected pull requests");
        Ok(prs)
    }

    /// Profile of `username` as a single-record set
    pub async fn collect_user_profile(&self, username: &str) -> Result<ResourceSet> {
        require("username", username)?;
        info!(username, "Collecting profile");

        let spec = RequestSpec::get_segments(&["users", username]);
        let page = self.executor.execute(&spec, &self.cancel).await?;
        if page.items.len() != 1 {
            return Err(Error::decode(
                &spec.path,
                format!("expected one profile record, got {}", page.items.len()),
            ));
        }

        info!(username, "Collected profile");
        Ok(ResourceSet::new(page.items))
    }

    /// Route `request` to the matching collection method
    pub async fn collect(&self, request: &CollectRequest) -> Result<ResourceSet> {
        match request {
            CollectRequest::Repos { username } => self.collect_user_repos(username).await,
            CollectRequest::Issues { owner, repo, state } => {
                self.collect_repo_issues(owner, repo, *state).await
            }
            CollectRequest::Prs { owner, repo, state } => {
                self.collect_pull_requests(owner, repo, *state).await
            }
            CollectRequest::Profile { username } => self.collect_user_profile(username).await,
        }
    }

    async fn paginate(&self, spec: &RequestSpec) -> Result<ResourceSet> {
        Paginator::new(self.executor.as_ref())
            .max_pages(self.config.max_pages)
            .collect_all(spec, &self.cancel)
            .await
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_value(field, "must not be empty"));
    }
    Ok(())
}
