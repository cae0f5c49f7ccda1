//! CLI commands and argument parsing

use crate::collector::CollectRequest;
use crate::output::OutputFormat;
use crate::types::{IssueState, LogLevel};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Collect repositories, issues, pull requests and profiles from the GitHub API
#[derive(Parser, Debug)]
#[command(name = "github-collector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Personal access token
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, env = "GITHUB_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Retries after the first attempt
    #[arg(long, env = "MAX_RETRIES", global = true)]
    pub max_retries: Option<u32>,

    /// Seconds between requests
    #[arg(long, env = "RATE_LIMIT_DELAY", global = true)]
    pub rate_limit_delay: Option<f64>,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", global = true)]
    pub request_timeout: Option<u64>,

    /// Directory for exported files
    #[arg(short, long, env = "OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Print records to stdout instead of writing a file
    #[arg(long, global = true)]
    pub stdout: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Stop after this many pages
    #[arg(long, global = true)]
    pub max_pages: Option<usize>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", global = true, value_enum, ignore_case = true)]
    pub log_level: Option<LogLevel>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Collect the repositories of a user
    Repos {
        /// GitHub username
        username: String,

        /// Include private repositories (requires a token)
        #[arg(long)]
        include_private: bool,
    },

    /// Collect the issues of a repository (pull requests included)
    Issues {
        /// Repository owner
        owner: String,

        /// Repository name
        repo: String,

        /// Issue state
        #[arg(long, value_enum, default_value_t = IssueState::All)]
        state: IssueState,
    },

    /// Collect the pull requests of a repository
    Prs {
        /// Repository owner
        owner: String,

        /// Repository name
        repo: String,

        /// Pull request state
        #[arg(long, value_enum, default_value_t = IssueState::All)]
        state: IssueState,
    },

    /// Collect a user profile
    Profile {
        /// GitHub username
        username: String,
    },
}

impl Commands {
    /// Collection request for this command
    pub fn to_request(&self) -> CollectRequest {
        match self {
            Commands::Repos { username, .. } => CollectRequest::repos(username),
            Commands::Issues { owner, repo, state } => CollectRequest::issues(owner, repo, *state),
            Commands::Prs { owner, repo, state } => CollectRequest::prs(owner, repo, *state),
            Commands::Profile { username } => CollectRequest::profile(username),
        }
    }
}
