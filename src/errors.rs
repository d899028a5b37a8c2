//! Error types surfaced by the search session.
//!
//! Every failure of a search (transport, HTTP status, timeout, malformed body)
//! collapses into a single [`SearchError`] so the presenter has one thing to
//! render. An empty result page is *not* an error; see
//! [`crate::session::SearchOutcome::NoResults`].

use std::fmt;

// === SearchError ===

/// A failed search. No retry is attempted by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The feed did not answer within the configured duration.
    Timeout { secs: u64 },
    /// Network-level failure (DNS, connection refused, reset, ...).
    Transport(String),
    /// The feed answered with a non-success status.
    Http { status: u16, message: String },
    /// The feed answered with a body that is not a valid result page.
    Decode(String),
    /// A search was requested without a query.
    EmptyQuery,
}

impl SearchError {
    /// HTTP status code carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Timeout { secs } => {
                write!(f, "Request took too long! Timeout after {} second(s)", secs)
            }
            SearchError::Transport(msg) => write!(f, "Network request failed: {}", msg),
            SearchError::Http { status, message } => write!(f, "{}: {}", status, message),
            SearchError::Decode(msg) => write!(f, "Malformed feed response: {}", msg),
            SearchError::EmptyQuery => write!(f, "Search query is empty"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SearchError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => SearchError::Transport(e.to_string()),
        }
    }
}

// === SelectError ===

/// Errors when picking one article out of the displayed results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// No article at that position on the current page.
    OutOfRange { index: usize, len: usize },
    /// The feed returned its removal placeholder instead of the article.
    Removed,
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectError::OutOfRange { index, len } => {
                write!(f, "No result at position {} (page has {})", index, len)
            }
            SelectError::Removed => {
                write!(f, "We could not find that news. Please try another one!")
            }
        }
    }
}

impl std::error::Error for SelectError {}
