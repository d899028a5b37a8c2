//! Command-line interface definitions for Awful News Search.
//!
//! Every option can also be supplied through an environment variable. Options
//! left unset fall back to the config file (`--config`) and then to built-in
//! defaults, see [`crate::config`].

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Awful News Search application.
///
/// # Examples
///
/// ```sh
/// # Interactive session
/// awful_news_search --access-key YOUR_KEY
///
/// # Run one search, print it and exit
/// awful_news_search --once "solar power"
///
/// # Use a config file and a custom bookmarks directory
/// awful_news_search -c ~/.config/news.yaml --bookmarks-dir /tmp/bookmarks
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Query to search for before the prompt opens
    pub query: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// News feed access key
    #[arg(long, env = "MEDIASTACK_ACCESS_KEY")]
    pub access_key: Option<String>,

    /// News feed endpoint
    #[arg(long, env = "MEDIASTACK_BASE_URL")]
    pub base_url: Option<String>,

    /// Seconds to wait for the feed before giving up
    #[arg(short, long, env = "NEWS_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Number of results per page
    #[arg(short = 'n', long, env = "NEWS_RESULTS_PER_PAGE")]
    pub results_per_page: Option<u32>,

    /// Directory holding the persisted bookmarks
    #[arg(long, env = "NEWS_BOOKMARKS_DIR")]
    pub bookmarks_dir: Option<PathBuf>,

    /// Print the results of the initial query and exit
    #[arg(long, requires = "query")]
    pub once: bool,
}
