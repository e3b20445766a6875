//! Settings layering: CLI flags > `SUPPORTDESK_*` environment > config file > defaults.
//!
//! clap resolves flags and environment variables together (see [`crate::cli::Cli`]);
//! this module folds the TOML file and the defaults in underneath.

pub mod file;

use anyhow::{Context, Result};
use std::path::PathBuf;

use supportdesk_api::ApiConfig;
use supportdesk_logging::default_data_dir;
use supportdesk_types::Channel;

use crate::cli::Cli;
pub use file::FileConfig;

/// Name of the config file looked up inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Fully resolved application settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub data_dir: PathBuf,
    pub channel: Channel,
    pub include_followup: bool,
    pub verbose: bool,
}

impl AppConfig {
    /// Resolve settings for this run, reading the config file if there is one
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let data_dir = match cli.data_dir.clone() {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?.with_context(|| {
                format!("Config file {} does not exist", path.display())
            })?,
            None => FileConfig::load(&data_dir.join(CONFIG_FILE_NAME))?.unwrap_or_default(),
        };

        Self::resolve(cli, data_dir, file)
    }

    /// Merge explicit settings over a loaded config file
    pub fn resolve(cli: &Cli, data_dir: PathBuf, file: FileConfig) -> Result<Self> {
        let backend_url = cli
            .backend_url
            .clone()
            .or(file.backend_url)
            .unwrap_or_else(|| supportdesk_types::DEFAULT_BACKEND_URL.to_string());

        let mut api = ApiConfig::new(&backend_url)
            .with_context(|| format!("Invalid backend URL '{}'", backend_url))?
            .with_verbose(cli.verbose);
        if let Some(path) = cli.tickets_path.clone().or(file.tickets_path) {
            api = api.with_tickets_path(&path);
        }

        let channel = match cli.channel.clone().or(file.channel) {
            Some(name) => name
                .parse::<Channel>()
                .with_context(|| format!("Invalid channel '{}'", name))?,
            None => Channel::default(),
        };

        let include_followup = !cli.no_followup && file.include_followup.unwrap_or(true);

        Ok(Self {
            api,
            data_dir,
            channel,
            include_followup,
            verbose: cli.verbose,
        })
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    /// `<data-dir>/logs`, created on demand
    pub fn logs_dir(&self) -> Result<PathBuf> {
        supportdesk_logging::logs_dir(&self.data_dir)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }
}
