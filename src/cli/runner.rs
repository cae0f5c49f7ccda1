//! CLI runner - executes commands

use crate::cancel::CancelToken;
use crate::cli::commands::{Cli, Commands};
use crate::collector::{CollectRequest, GithubCollector};
use crate::config::Settings;
use crate::error::Result;
use crate::output::{write_records, JsonExporter};
use crate::pagination::ResourceSet;
use crate::types::LogLevel;
use std::path::PathBuf;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    settings: Settings,
}

impl Runner {
    /// Create a runner, loading the settings file and applying overrides
    pub fn new(cli: Cli) -> Result<Self> {
        let settings = Self::load_settings(&cli)?;
        Ok(Self { cli, settings })
    }

    /// Effective settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Level the subscriber should log at
    pub fn log_level(&self) -> LogLevel {
        if self.cli.verbose {
            LogLevel::Debug
        } else {
            self.settings.log_level
        }
    }

    /// Run the CLI command. Returns the export path when a file was written.
    pub async fn run(&self) -> Result<Option<PathBuf>> {
        let request = self.cli.command.to_request();
        let cancel = CancelToken::new();
        let collector = GithubCollector::new(self.settings.to_collector_config()?)?
            .with_cancel_token(cancel.clone());

        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling collection");
                cancel.cancel();
            }
        });
        let result = collector.collect(&request).await;
        interrupt.abort();
        let records = result?;

        let stats = collector.stats();
        info!(
            kind = %request.kind(),
            records = records.len(),
            requests = stats.requests,
            retries = stats.retries,
            rate_limit_waits = stats.rate_limit_waits,
            "Collection finished"
        );

        self.emit(&request, &records)
    }

    fn emit(&self, request: &CollectRequest, records: &ResourceSet) -> Result<Option<PathBuf>> {
        if self.cli.stdout {
            write_records(std::io::stdout().lock(), records, self.cli.format)?;
            return Ok(None);
        }

        let exporter = JsonExporter::new(&self.settings.output_dir, self.cli.format);
        let path = exporter.export(records, &request.file_stem())?;
        println!("{}", path.display());
        Ok(Some(path))
    }

    /// Settings file first, then environment and command-line values
    fn load_settings(cli: &Cli) -> Result<Settings> {
        let mut settings = match &cli.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };

        if let Some(token) = &cli.token {
            settings.github_token = Some(token.clone());
        }
        if let Some(url) = &cli.api_url {
            settings.api_url.clone_from(url);
        }
        if let Some(max_retries) = cli.max_retries {
            settings.max_retries = max_retries;
        }
        if let Some(delay) = cli.rate_limit_delay {
            settings.rate_limit_delay = delay;
        }
        if let Some(timeout) = cli.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(dir) = &cli.output_dir {
            settings.output_dir.clone_from(dir);
        }
        if let Some(level) = cli.log_level {
            settings.log_level = level;
        }
        if cli.max_pages.is_some() {
            settings.max_pages = cli.max_pages;
        }
        if let Commands::Repos {
            include_private: true,
            ..
        } = cli.command
        {
            settings.include_private = true;
        }

        settings.validate()?;
        Ok(settings)
    }
}
