//! # Awful News Search
//!
//! Search a news feed by keyword, page and sort the results, read an article
//! in full, and keep bookmarks that survive restarts.
//!
//! ## Usage
//!
//! ```sh
//! MEDIASTACK_ACCESS_KEY=... awful_news_search "solar power"
//! ```
//!
//! ## Architecture
//!
//! 1. **Session** ([`session`]): query/page/sort state, fetches through the
//!    feed client raced against a timeout, discards stale responses
//! 2. **Bookmarks** ([`bookmarks`]): saved articles persisted as one JSON
//!    document in a key-value store ([`storage`])
//! 3. **Presenter** ([`presenter`]): line-oriented terminal front end that
//!    renders snapshots and turns commands into core calls

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod bookmarks;
mod cli;
mod config;
mod errors;
mod models;
mod presenter;
mod session;
mod storage;
mod timeout;
mod utils;

use api::MediastackClient;
use bookmarks::BookmarkStore;
use cli::Cli;
use presenter::{Command, Presenter};
use session::SearchSession;
use storage::FileStore;

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout belongs to the presenter) ---
    tfmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_news_search starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.query, once = args.once, "Parsed CLI arguments");

    let config = match config::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };
    if config.access_key.is_empty() {
        warn!("No access key configured; the feed will reject requests");
    }
    info!(
        base_url = %config.base_url,
        timeout_secs = config.timeout_secs,
        results_per_page = config.results_per_page,
        bookmarks_dir = %config.bookmarks_dir.display(),
        "Configuration resolved"
    );

    let client = MediastackClient::new(&config)?;
    let session = SearchSession::new(client, config.results_per_page, config.timeout());
    let bookmarks = BookmarkStore::load(FileStore::new(&config.bookmarks_dir));
    let mut presenter = Presenter::new(session, bookmarks, std::io::stdout());

    if let Some(query) = &args.query {
        presenter.handle(Command::Search(query.clone())).await?;
    }
    if !args.once {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        presenter.run(stdin).await?;
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Session complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_is_info() {
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.to_string(), "info");
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing::level_filters::LevelFilter::INFO)
        );
    }
}
