//! Static configuration: access key, endpoint, timeout, page size, filters.
//!
//! Values are resolved in three layers: built-in defaults, an optional YAML
//! file, then CLI flags and environment variables (see [`crate::cli::Cli`]).
//!
//! ```yaml
//! access_key: "0123456789abcdef"
//! timeout_secs: 10
//! results_per_page: 5
//! languages: en
//! countries: us,ca
//! ```

use crate::cli::Cli;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_BASE_URL: &str = "http://api.mediastack.com/v1/news";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub access_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub results_per_page: u32,
    pub languages: String,
    pub countries: String,
    pub bookmarks_dir: PathBuf,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            languages: "en".to_string(),
            countries: "us,ca".to_string(),
            bookmarks_dir: default_bookmarks_dir(),
        }
    }
}

impl NewsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply CLI flags (and their env vars) over the file/default values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(key) = &cli.access_key {
            self.access_key = key.clone();
        }
        if let Some(url) = &cli.base_url {
            self.base_url = url.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(n) = cli.results_per_page {
            self.results_per_page = n;
        }
        if let Some(dir) = &cli.bookmarks_dir {
            self.bookmarks_dir = dir.clone();
        }
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be at least 1".into());
        }
        if self.results_per_page == 0 {
            return Err("results_per_page must be at least 1".into());
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| format!("invalid base_url '{}': {}", self.base_url, e))?;
        Ok(())
    }
}

/// `<platform data dir>/awful_news_search`, or the working directory when the
/// platform has none.
pub fn default_bookmarks_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("awful_news_search")
}

/// Parse a YAML config file. Missing keys keep their defaults.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub fn load_config(path: &str) -> Result<NewsConfig, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)?;
    let config: NewsConfig = serde_yaml::from_str(&raw)?;
    info!(
        timeout_secs = config.timeout_secs,
        results_per_page = config.results_per_page,
        "Loaded configuration file"
    );
    Ok(config)
}

/// Defaults, then the optional file from `--config`, then CLI overrides.
pub fn resolve(cli: &Cli) -> Result<NewsConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => NewsConfig::default(),
    };
    config.apply_cli(cli);
    config.validate()?;
    Ok(config)
}
