//! Collection requests

use crate::types::{IssueState, ResourceKind};
use serde::{Deserialize, Serialize};

/// One collection call, routed by [`GithubCollector::collect`](super::GithubCollector::collect)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectRequest {
    /// Repositories owned by `username`
    Repos { username: String },
    /// Issues of `owner/repo` (pull requests included)
    Issues {
        owner: String,
        repo: String,
        #[serde(default)]
        state: IssueState,
    },
    /// Pull requests of `owner/repo`
    Prs {
        owner: String,
        repo: String,
        #[serde(default)]
        state: IssueState,
    },
    /// Profile of `username`
    Profile { username: String },
}

impl CollectRequest {
    /// Repositories of a user
    pub fn repos(username: impl Into<String>) -> Self {
        Self::Repos {
            username: username.into(),
        }
    }

    /// Issues of a repository
    pub fn issues(owner: impl Into<String>, repo: impl Into<String>, state: IssueState) -> Self {
        Self::Issues {
            owner: owner.into(),
            repo: repo.into(),
            state,
        }
    }

    /// Pull requests of a repository
    pub fn prs(owner: impl Into<String>, repo: impl Into<String>, state: IssueState) -> Self {
        Self::Prs {
            owner: owner.into(),
            repo: repo.into(),
            state,
        }
    }

    /// Profile of a user
    pub fn profile(username: impl Into<String>) -> Self {
        Self::Profile {
            username: username.into(),
        }
    }

    /// Resource kind requested
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Repos { .. } => ResourceKind::Repos,
            Self::Issues { .. } => ResourceKind::Issues,
            Self::Prs { .. } => ResourceKind::Prs,
            Self::Profile { .. } => ResourceKind::Profile,
        }
    }

    /// File name stem for exports, e.g. `octocat_repos` or `rust-lang_rust_issues`
    pub fn file_stem(&self) -> String {
        match self {
            Self::Repos { username } | Self::Profile { username } => {
                format!("{username}_{}", self.kind())
            }
            Self::Issues { owner, repo, .. } | Self::Prs { owner, repo, .. } => {
                format!("{owner}_{repo}_{}", self.kind())
            }
        }
    }
}
