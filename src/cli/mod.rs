//! CLI module
//!
//! Command-line interface for collecting and exporting GitHub resources.
//!
//! # Commands
//!
//! - `repos` - Repositories of a user
//! - `issues` - Issues of a repository
//! - `prs` - Pull requests of a repository
//! - `profile` - A user profile

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
