//! Terminal presenter: reads commands, calls into the core, prints snapshots.
//!
//! The presenter never mutates search or bookmark state itself; it goes
//! through [`SearchSession`] and [`BookmarkStore`] and renders what comes
//! back. Rendering functions are pure so they can be tested without a
//! terminal.
//!
//! # Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `search <query>` | New search, page 1, newest first |
//! | `sort <published_desc\|published_asc\|popularity>` | Re-run the query with another sort |
//! | `page <n>`, `next`, `prev` | Move between result pages |
//! | `open <n>` | Show result `n` in full |
//! | `bookmark <n>` | Toggle the bookmark on result `n` |
//! | `bookmarks` | List saved articles |
//! | `forget <n>` | Remove saved article `n` |
//! | `help`, `quit` | |

use crate::api::NewsFeed;
use crate::bookmarks::BookmarkStore;
use crate::errors::{SearchError, SelectError};
use crate::models::{Article, SearchState, SortBy};
use crate::session::{SearchOutcome, SearchSession};
use crate::storage::KeyValueStore;
use crate::utils::time_ago;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::io::{self, Write};
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, instrument};

const NO_RESULTS: &str = "No news found for your query! Please try another one!";
const HELP: &str = "\
Commands:
  search <query>      search for news
  sort <mode>         published_desc | published_asc | popularity
  page <n>            go to page n
  next / prev         next or previous page
  open <n>            show result n
  bookmark <n>        bookmark or un-bookmark result n
  bookmarks           list saved articles
  forget <n>          remove saved article n
  help                show this message
  quit                exit";

/// A parsed line of user input. Positions are 1-based as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Sort(SortBy),
    Page(u32),
    Next,
    Prev,
    Open(usize),
    Bookmark(usize),
    Bookmarks,
    Forget(usize),
    Help,
    Quit,
}

fn position(arg: &str) -> Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("expected a number starting at 1, got '{}'", arg.trim())),
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let arg = arg.trim();

        match word.to_lowercase().as_str() {
            "search" | "s" if !arg.is_empty() => Ok(Command::Search(arg.to_string())),
            "search" | "s" => Err("usage: search <query>".to_string()),
            "sort" => Ok(Command::Sort(arg.parse()?)),
            "page" | "p" => {
                let n = position(arg)?;
                u32::try_from(n)
                    .map(Command::Page)
                    .map_err(|_| format!("page {} is out of range", n))
            }
            "next" | "n" => Ok(Command::Next),
            "prev" => Ok(Command::Prev),
            "open" | "o" => Ok(Command::Open(position(arg)?)),
            "bookmark" | "b" => Ok(Command::Bookmark(position(arg)?)),
            "bookmarks" | "bm" => Ok(Command::Bookmarks),
            "forget" => Ok(Command::Forget(position(arg)?)),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}' (try 'help')", other)),
        }
    }
}

/// One preview row: position, source, title, age, bookmark marker.
pub fn render_preview(position: usize, article: &Article, now: DateTime<Utc>) -> String {
    let age = article
        .published_at_utc()
        .map(|t| time_ago(t, now))
        .unwrap_or_else(|| "unknown date".to_string());
    let marker = if article.bookmarked { " [*]" } else { "" };
    format!(
        "{:>3}. [{}] {} ({}){}",
        position,
        article.source,
        article.title.trim(),
        age,
        marker
    )
}

/// Totals line, preview rows and pagination hints for a search page.
///
/// `results_to_display` is expected to carry bookmark flags already.
pub fn render_results(state: &SearchState, now: DateTime<Utc>) -> String {
    if state.results_to_display.is_empty() {
        return NO_RESULTS.to_string();
    }

    let header = format!(
        "Total Results: {}   Total Pages: {}   Page: {}   Sort by: {}",
        state.total_results,
        state.total_pages(),
        state.page,
        state.sort_by.label()
    );
    let rows = state
        .results_to_display
        .iter()
        .enumerate()
        .map(|(i, a)| render_preview(i + 1, a, now))
        .join("\n");

    let controls = state.pagination_controls();
    let nav = [
        controls.prev.map(|p| format!("prev: page {}", p)),
        controls.next.map(|p| format!("next: page {}", p)),
    ]
    .into_iter()
    .flatten()
    .join("   ");

    if nav.is_empty() {
        format!("{}\n{}", header, rows)
    } else {
        format!("{}\n{}\n{}", header, rows, nav)
    }
}

/// Full view of one article.
pub fn render_article(article: &Article) -> String {
    let mut lines = vec![
        article.source.to_uppercase(),
        article.title.trim().to_string(),
        format!("Updated {}", article.published_stamp()),
    ];
    if let Some(author) = article.author.as_deref().filter(|a| !a.is_empty()) {
        lines.push(format!("By {}", author));
    }
    lines.push(String::new());
    lines.push(article.description.clone().unwrap_or_default());
    lines.push(String::new());
    lines.push(article.url.clone());
    if let Some(image) = &article.image {
        lines.push(format!("Image: {}", image));
    }
    if article.bookmarked {
        lines.push("[*] bookmarked".to_string());
    }
    lines.join("\n")
}

pub fn render_bookmarks(bookmarks: &[Article], now: DateTime<Utc>) -> String {
    if bookmarks.is_empty() {
        return "No bookmarks yet.".to_string();
    }
    bookmarks
        .iter()
        .enumerate()
        .map(|(i, a)| render_preview(i + 1, a, now))
        .join("\n")
}

fn render_failure(e: &SearchError) -> String {
    match e {
        SearchError::EmptyQuery => "Search for something first.".to_string(),
        other => format!("Error: {}", other),
    }
}

fn render_select_error(position: usize, e: &SelectError) -> String {
    match e {
        SelectError::OutOfRange { len, .. } => {
            format!("No result {} on this page ({} shown).", position, len)
        }
        SelectError::Removed => e.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Presenter<F, S, W> {
    session: SearchSession<F>,
    bookmarks: BookmarkStore<S>,
    out: W,
}

impl<F, S, W> Presenter<F, S, W>
where
    F: NewsFeed,
    S: KeyValueStore,
    W: Write,
{
    pub fn new(session: SearchSession<F>, bookmarks: BookmarkStore<S>, out: W) -> Self {
        Self {
            session,
            bookmarks,
            out,
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (SearchSession<F>, BookmarkStore<S>, W) {
        (self.session, self.bookmarks, self.out)
    }

    /// Read commands until end of input or `quit`.
    pub async fn run<R>(&mut self, input: R) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        writeln!(self.out, "Type 'help' for commands.")?;
        self.prompt()?;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                self.prompt()?;
                continue;
            }
            match line.parse::<Command>() {
                Ok(cmd) => {
                    if self.handle(cmd).await? == Flow::Quit {
                        break;
                    }
                }
                Err(msg) => writeln!(self.out, "{}", msg)?,
            }
            self.prompt()?;
        }
        info!("Presenter finished");
        Ok(())
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn handle(&mut self, cmd: Command) -> io::Result<Flow> {
        match cmd {
            Command::Search(query) => {
                let outcome = self.session.search(&query, 1, true).await;
                self.show_outcome(outcome)?;
            }
            Command::Sort(sort_by) => {
                self.session.set_sort(sort_by);
                let query = self.session.snapshot().query;
                let outcome = self.session.search(&query, 1, false).await;
                self.show_outcome(outcome)?;
            }
            Command::Page(page) => {
                let outcome = self.session.go_to_page(page).await;
                self.show_outcome(outcome)?;
            }
            Command::Next => self.step(true).await?,
            Command::Prev => self.step(false).await?,
            Command::Open(n) => match self.select(n) {
                Ok(article) => {
                    let article = self.bookmarks.mark(&article);
                    writeln!(self.out, "{}", render_article(&article))?;
                }
                Err(e) => writeln!(self.out, "{}", render_select_error(n, &e))?,
            },
            Command::Bookmark(n) => match self.select(n) {
                Ok(article) => {
                    let mut article = self.bookmarks.mark(&article);
                    self.bookmarks.toggle(&mut article);
                    debug!(bookmarked = article.bookmarked, "Toggled bookmark");
                    self.report_toggle(&article)?;
                }
                Err(e) => writeln!(self.out, "{}", render_select_error(n, &e))?,
            },
            Command::Bookmarks => {
                let listing = render_bookmarks(self.bookmarks.articles(), Utc::now());
                writeln!(self.out, "{}", listing)?;
            }
            Command::Forget(n) => {
                let saved = n
                    .checked_sub(1)
                    .and_then(|i| self.bookmarks.articles().get(i).cloned());
                match saved {
                    Some(mut article) => {
                        self.bookmarks.toggle(&mut article);
                        self.report_toggle(&article)?;
                    }
                    None if self.bookmarks.is_empty() => writeln!(self.out, "No bookmarks yet.")?,
                    None => writeln!(self.out, "No bookmark at position {}.", n)?,
                }
            }
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Result at 1-based `position` on the current page.
    fn select(&self, position: usize) -> Result<Article, SelectError> {
        match position.checked_sub(1) {
            Some(index) => self.session.select_result(index),
            None => Err(SelectError::OutOfRange {
                index: position,
                len: self.session.snapshot().results_to_display.len(),
            }),
        }
    }

    /// Follow the next (`forward`) or previous pagination control, if shown.
    async fn step(&mut self, forward: bool) -> io::Result<()> {
        let controls = self.session.snapshot().pagination_controls();
        let target = if forward { controls.next } else { controls.prev };
        match target {
            Some(page) => {
                let outcome = self.session.go_to_page(page).await;
                self.show_outcome(outcome)
            }
            None => writeln!(self.out, "No such page."),
        }
    }

    fn report_toggle(&mut self, article: &Article) -> io::Result<()> {
        let verb = if article.bookmarked {
            "Bookmarked"
        } else {
            "Removed bookmark"
        };
        writeln!(
            self.out,
            "{}: {} ({} saved)",
            verb,
            article.title.trim(),
            self.bookmarks.len()
        )
    }

    /// Render a search outcome. Superseded searches print nothing.
    pub fn show_outcome(&mut self, outcome: Result<SearchOutcome, SearchError>) -> io::Result<()> {
        debug!(phase = ?self.session.phase(), "Rendering search outcome");
        match outcome {
            Ok(SearchOutcome::Results(mut state)) => {
                state.results_to_display = state
                    .results_to_display
                    .iter()
                    .map(|a| self.bookmarks.mark(a))
                    .collect();
                writeln!(self.out, "{}", render_results(&state, Utc::now()))
            }
            Ok(SearchOutcome::NoResults(_)) => writeln!(self.out, "{}", NO_RESULTS),
            Ok(SearchOutcome::Superseded) => Ok(()),
            Err(e) => writeln!(self.out, "{}", render_failure(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FeedRequest;
    use crate::models::{FeedResponse, Pagination};
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use std::time::Duration;

    /// Twelve matches for any query.
    struct TwelveFeed;

    impl NewsFeed for TwelveFeed {
        async fn fetch(&self, request: &FeedRequest) -> Result<FeedResponse, SearchError> {
            let total = 12u64;
            let end = (request.offset + u64::from(request.limit)).min(total);
            let data = (request.offset..end)
                .map(|i| Article {
                    title: format!("Story {}", i),
                    description: Some(format!("story-{}", i)),
                    source: "Wire".to_string(),
                    published_at: "2024-03-01T10:00:00+00:00".to_string(),
                    url: format!("https://example.com/{}", i),
                    ..Article::default()
                })
                .collect();
            Ok(FeedResponse {
                pagination: Pagination {
                    limit: u64::from(request.limit),
                    offset: request.offset,
                    count: end.saturating_sub(request.offset),
                    total,
                },
                data,
            })
        }
    }

    fn presenter() -> Presenter<TwelveFeed, MemoryStore, Vec<u8>> {
        let session = SearchSession::new(TwelveFeed, 5, Duration::from_secs(5));
        let bookmarks = BookmarkStore::load(MemoryStore::default());
        Presenter::new(session, bookmarks, Vec::new())
    }

    fn output(p: Presenter<TwelveFeed, MemoryStore, Vec<u8>>) -> String {
        let (_, _, out) = p.into_parts();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "search  solar power ".parse::<Command>(),
            Ok(Command::Search("solar power".to_string()))
        );
        assert_eq!("sort popularity".parse::<Command>(), Ok(Command::Sort(SortBy::Popularity)));
        assert_eq!("page 3".parse::<Command>(), Ok(Command::Page(3)));
        assert_eq!("open 2".parse::<Command>(), Ok(Command::Open(2)));
        assert_eq!("NEXT".parse::<Command>(), Ok(Command::Next));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert!("search".parse::<Command>().is_err());
        assert!("page 0".parse::<Command>().is_err());
        assert!("open x".parse::<Command>().is_err());
        assert!("sort newest".parse::<Command>().is_err());
        assert!("frobnicate".parse::<Command>().is_err());
    }

    #[test]
    fn test_render_preview() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap();
        let mut a = Article {
            title: "  Story  ".to_string(),
            source: "Wire".to_string(),
            published_at: "2024-03-01T10:00:00+00:00".to_string(),
            ..Article::default()
        };
        assert_eq!(render_preview(1, &a, now), "  1. [Wire] Story (3 hours ago)");
        a.bookmarked = true;
        a.published_at = "garbage".to_string();
        assert_eq!(render_preview(12, &a, now), " 12. [Wire] Story (unknown date) [*]");
    }

    #[test]
    fn test_render_results_empty() {
        let state = SearchState::new(5);
        assert_eq!(render_results(&state, Utc::now()), NO_RESULTS);
    }

    #[test]
    fn test_render_article() {
        let a = Article {
            title: "Title".to_string(),
            description: Some("Body text".to_string()),
            author: Some("Jane Roe".to_string()),
            source: "Wire".to_string(),
            published_at: "2024-03-01T10:00:00+00:00".to_string(),
            url: "https://example.com/a".to_string(),
            bookmarked: true,
            ..Article::default()
        };
        let text = render_article(&a);
        assert!(text.starts_with("WIRE\nTitle\nUpdated 2024-03-01 10:00:00\nBy Jane Roe"));
        assert!(text.contains("Body text"));
        assert!(text.contains("https://example.com/a"));
        assert!(text.ends_with("[*] bookmarked"));
    }

    #[tokio::test]
    async fn test_search_and_paginate() {
        let mut p = presenter();
        p.handle(Command::Search("wire".into())).await.unwrap();
        p.handle(Command::Next).await.unwrap();
        p.handle(Command::Next).await.unwrap();
        p.handle(Command::Next).await.unwrap();

        assert_eq!(p.session.snapshot().page, 3);
        let out = output(p);
        assert!(out.contains("Total Results: 12   Total Pages: 3   Page: 1"));
        assert!(out.contains("next: page 2"));
        assert!(out.contains("prev: page 2"));
        assert!(out.contains("No such page."));
    }

    #[tokio::test]
    async fn test_sort_restarts_at_first_page() {
        let mut p = presenter();
        p.handle(Command::Search("wire".into())).await.unwrap();
        p.handle(Command::Page(2)).await.unwrap();
        p.handle(Command::Sort(SortBy::PublishedAsc)).await.unwrap();

        let state = p.session.snapshot();
        assert_eq!(state.page, 1);
        assert_eq!(state.sort_by, SortBy::PublishedAsc);
        assert!(output(p).contains("Sort by: Oldest"));
    }

    #[tokio::test]
    async fn test_bookmark_toggle_and_forget() {
        let mut p = presenter();
        p.handle(Command::Search("wire".into())).await.unwrap();
        p.handle(Command::Bookmark(2)).await.unwrap();
        assert_eq!(p.bookmarks.len(), 1);
        assert_eq!(
            p.bookmarks.articles()[0].description.as_deref(),
            Some("story-1")
        );

        p.handle(Command::Bookmark(2)).await.unwrap();
        assert!(p.bookmarks.is_empty());

        p.handle(Command::Bookmark(3)).await.unwrap();
        p.handle(Command::Forget(1)).await.unwrap();
        assert!(p.bookmarks.is_empty());

        let out = output(p);
        assert!(out.contains("Bookmarked: Story 1 (1 saved)"));
        assert!(out.contains("Removed bookmark: Story 1 (0 saved)"));
    }

    #[tokio::test]
    async fn test_page_before_search() {
        let mut p = presenter();
        p.handle(Command::Page(2)).await.unwrap();
        p.handle(Command::Open(1)).await.unwrap();
        let out = output(p);
        assert!(out.contains("Search for something first."));
        assert!(out.contains("No result 1 on this page (0 shown)."));
    }

    #[tokio::test]
    async fn test_position_zero_is_rejected() {
        let mut p = presenter();
        p.handle(Command::Forget(0)).await.unwrap();
        p.handle(Command::Search("wire".into())).await.unwrap();
        p.handle(Command::Open(0)).await.unwrap();
        p.handle(Command::Bookmark(0)).await.unwrap();
        p.handle(Command::Bookmark(1)).await.unwrap();
        p.handle(Command::Forget(0)).await.unwrap();
        p.handle(Command::Forget(2)).await.unwrap();

        assert_eq!(p.bookmarks.len(), 1);
        let out = output(p);
        assert!(out.contains("No bookmarks yet."));
        assert_eq!(out.matches("No result 0 on this page (5 shown).").count(), 2);
        assert!(out.contains("No bookmark at position 0."));
        assert!(out.contains("No bookmark at position 2."));
    }

    #[tokio::test]
    async fn test_run_reads_until_quit() {
        let mut p = presenter();
        let script = b"search wire\nbogus\n\nopen 1\nquit\nsearch never\n";
        p.run(tokio::io::BufReader::new(&script[..])).await.unwrap();

        assert_eq!(p.session.snapshot().query, "wire");
        let out = output(p);
        assert!(out.contains("unknown command 'bogus'"));
        assert!(out.contains("WIRE\nStory 0"));
    }
}
