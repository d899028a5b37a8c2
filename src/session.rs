//! Search session: query, page and sort state plus the results on display.
//!
//! A [`SearchSession`] is the only owner of [`SearchState`]. The presenter
//! drives it through [`search`](SearchSession::search),
//! [`set_sort`](SearchSession::set_sort),
//! [`go_to_page`](SearchSession::go_to_page) and
//! [`select_result`](SearchSession::select_result), and renders the snapshots
//! it gets back.
//!
//! # Ordering
//!
//! Every search stamps a token from a monotonically increasing counter before
//! it suspends on the feed. When the response arrives it is applied only if
//! its token is still the latest one issued; otherwise the call returns
//! [`SearchOutcome::Superseded`] and state is left alone. Changing the sort
//! also bumps the counter, so a response fetched under the old sort is
//! discarded.
//!
//! State is only touched between suspension points, so the lock is never held
//! across an `.await`.

use crate::api::{FeedRequest, NewsFeed};
use crate::errors::{SearchError, SelectError};
use crate::models::{Article, SearchState, SortBy};
use crate::timeout::race_with_timeout;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Where the session is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Result of a search that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The page was applied and has at least one article.
    Results(SearchState),
    /// The page was applied and is empty. Not an error.
    NoResults(SearchState),
    /// A newer search was issued while this one was in flight; its response
    /// was discarded and there is nothing to render.
    Superseded,
}

#[derive(Debug)]
struct Inner {
    state: SearchState,
    phase: Phase,
}

pub struct SearchSession<F> {
    feed: F,
    timeout: Duration,
    inner: Mutex<Inner>,
    latest: AtomicU64,
}

impl<F: NewsFeed> SearchSession<F> {
    pub fn new(feed: F, results_per_page: u32, timeout: Duration) -> Self {
        Self {
            feed,
            timeout,
            inner: Mutex::new(Inner {
                state: SearchState::new(results_per_page),
                phase: Phase::Idle,
            }),
            latest: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue_token(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SearchState {
        self.lock().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Fetch page `page` of `query` under the current sort.
    ///
    /// `is_new_query` marks a fresh search from the search box: the sort is
    /// reset to [`SortBy::PublishedDesc`] before the request is built.
    /// Query, page, total and results are replaced together once the response
    /// is decoded, never partially.
    #[instrument(level = "info", skip(self, query), fields(query = %query))]
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        is_new_query: bool,
    ) -> Result<SearchOutcome, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let token = self.issue_token();
        let request = {
            let mut inner = self.lock();
            if is_new_query {
                inner.state.sort_by = SortBy::PublishedDesc;
            }
            inner.phase = Phase::Loading;
            FeedRequest {
                keywords: query.to_string(),
                sort: inner.state.sort_by,
                offset: inner.state.offset_for(page),
                limit: inner.state.results_per_page,
            }
        };
        debug!(token, offset = request.offset, sort = %request.sort, "Issuing search");

        let result = match race_with_timeout(self.feed.fetch(&request), self.timeout).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        };

        let mut inner = self.lock();
        if !self.is_latest(token) {
            info!(
                token,
                latest = self.latest.load(Ordering::SeqCst),
                "Discarding stale search response"
            );
            return Ok(SearchOutcome::Superseded);
        }

        match result {
            Ok(response) => {
                inner.state.results_to_display = response.data;
                inner.state.total_results = response.pagination.total;
                inner.state.query = query.to_string();
                inner.state.page = page;
                inner.state.sort_by = request.sort;
                inner.phase = Phase::Ready;

                let snapshot = inner.state.clone();
                info!(
                    count = snapshot.results_to_display.len(),
                    total = snapshot.total_results,
                    pages = snapshot.total_pages(),
                    "Search applied"
                );
                if snapshot.results_to_display.is_empty() {
                    Ok(SearchOutcome::NoResults(snapshot))
                } else {
                    Ok(SearchOutcome::Results(snapshot))
                }
            }
            Err(e) => {
                inner.phase = Phase::Failed;
                error!(error = %e, status = ?e.status(), "Search failed");
                Err(e)
            }
        }
    }

    /// Change the sort and go back to page 1. Does not fetch.
    ///
    /// Any search still in flight was built with the old sort and will come
    /// back as [`SearchOutcome::Superseded`], so a `Loading` phase drops back
    /// to `Idle`.
    pub fn set_sort(&self, sort_by: SortBy) {
        let mut inner = self.lock();
        inner.state.sort_by = sort_by;
        inner.state.page = 1;
        if inner.phase == Phase::Loading {
            inner.phase = Phase::Idle;
        }
        let token = self.issue_token();
        debug!(%sort_by, token, phase = ?inner.phase, "Sort changed");
    }

    /// Fetch another page of the current query.
    ///
    /// `page` is expected to come from the rendered pagination controls and
    /// is not checked against the number of pages.
    pub async fn go_to_page(&self, page: u32) -> Result<SearchOutcome, SearchError> {
        let query = self.lock().state.query.clone();
        if query.is_empty() {
            warn!(page, "Page change requested before any search");
            return Err(SearchError::EmptyQuery);
        }
        self.search(&query, page, false).await
    }

    /// The article at `index` on the current page.
    pub fn select_result(&self, index: usize) -> Result<Article, SelectError> {
        let inner = self.lock();
        let results = &inner.state.results_to_display;
        let article = results.get(index).ok_or(SelectError::OutOfRange {
            index,
            len: results.len(),
        })?;
        if article.is_removed() {
            warn!(index, "Selected article was removed upstream");
            return Err(SelectError::Removed);
        }
        Ok(article.clone())
    }
}
