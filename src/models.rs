//! Data models for feed articles and the search session.
//!
//! - [`Article`]: one record of the news feed, also the unit of bookmarking
//! - [`SortBy`]: the three sort modes the feed understands
//! - [`SearchState`]: query/page/sort plus the page of results on display
//! - [`FeedResponse`]: the JSON envelope returned by the feed
//!
//! Field names follow the feed's snake_case JSON so the same types are used
//! for decoding responses and for the persisted bookmark list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Title and url the feed substitutes for articles it has taken down.
const REMOVED_MARKER: &str = "[Removed]";
const REMOVED_URL: &str = "https://removed.com";

/// A news article as returned by the feed.
///
/// Articles have no upstream identifier. Two articles are the same bookmark
/// iff their `description` fields are equal, see [`Article::same_bookmark`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Name of the publisher, e.g. "CNN".
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
    /// Publish time as sent by the feed. Not guaranteed to be well formed.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub published_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bookmarked: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Article {
    /// Bookmark identity: equal descriptions, nothing else.
    ///
    /// Two articles without a description are also considered the same.
    pub fn same_bookmark(&self, other: &Article) -> bool {
        self.description == other.description
    }

    /// First 19 characters of `published_at` with a literal `Z` appended.
    ///
    /// The feed sends `2024-03-01T10:22:00+00:00`; the prefix turns that into
    /// `2024-03-01T10:22:00Z` which parses as RFC 3339.
    pub fn timestamp_prefix(&self) -> String {
        let mut prefix: String = self.published_at.chars().take(19).collect();
        prefix.push('Z');
        prefix
    }

    /// Publish time in UTC, or `None` when the feed sent something unparseable.
    pub fn published_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp_prefix())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// `YYYY-MM-DD HH:MM:SS` from the first 19 characters of `published_at`.
    pub fn published_stamp(&self) -> String {
        self.published_at
            .chars()
            .take(19)
            .map(|c| if c == 'T' { ' ' } else { c })
            .collect()
    }

    /// Whether the feed returned its takedown placeholder for this record.
    pub fn is_removed(&self) -> bool {
        self.title == REMOVED_MARKER && self.url == REMOVED_URL
    }
}

/// Sort modes accepted by the feed's `sort` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Newest first. Applied to every new query.
    #[default]
    PublishedDesc,
    PublishedAsc,
    Popularity,
}

impl SortBy {
    /// The value sent as the `sort` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortBy::PublishedDesc => "published_desc",
            SortBy::PublishedAsc => "published_asc",
            SortBy::Popularity => "popularity",
        }
    }

    /// Label shown next to the results.
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::PublishedDesc => "Most Recent",
            SortBy::PublishedAsc => "Oldest",
            SortBy::Popularity => "Popularity",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "published_desc" => Ok(SortBy::PublishedDesc),
            "published_asc" => Ok(SortBy::PublishedAsc),
            "popularity" => Ok(SortBy::Popularity),
            other => Err(format!(
                "unknown sort option '{}' (expected published_desc, published_asc or popularity)",
                other
            )),
        }
    }
}

/// Query, paging and sort context plus the page of results on display.
///
/// `results_to_display` always belongs to exactly one (query, page, sort_by)
/// combination: the most recently applied fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchState {
    pub query: String,
    /// Total matches reported by the feed. May be an approximation.
    pub total_results: u64,
    pub results_to_display: Vec<Article>,
    /// 1-based.
    pub page: u32,
    pub results_per_page: u32,
    pub sort_by: SortBy,
}

impl SearchState {
    pub fn new(results_per_page: u32) -> Self {
        Self {
            query: String::new(),
            total_results: 0,
            results_to_display: Vec::new(),
            page: 1,
            results_per_page,
            sort_by: SortBy::default(),
        }
    }

    /// `ceil(total_results / results_per_page)`.
    pub fn total_pages(&self) -> u64 {
        if self.results_per_page == 0 {
            return 0;
        }
        self.total_results.div_ceil(u64::from(self.results_per_page))
    }

    /// Zero-based index of the first result of `page`.
    pub fn offset_for(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.results_per_page)
    }

    /// Previous/next page buttons for the current page.
    pub fn pagination_controls(&self) -> PaginationControls {
        let cur = u64::from(self.page);
        let pages = self.total_pages();

        if cur == 1 && pages > 1 {
            PaginationControls {
                prev: None,
                next: Some(self.page + 1),
            }
        } else if cur == pages && pages > 1 {
            PaginationControls {
                prev: Some(self.page - 1),
                next: None,
            }
        } else if cur < pages {
            PaginationControls {
                prev: Some(self.page - 1),
                next: Some(self.page + 1),
            }
        } else {
            PaginationControls::default()
        }
    }
}

/// Page numbers the pagination buttons lead to. `None` hides the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationControls {
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

/// Envelope of a successful feed response.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    pub pagination: Pagination,
    #[serde(default)]
    pub data: Vec<Article>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub count: u64,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(description: Option<&str>, url: &str, title: &str) -> Article {
        Article {
            title: title.to_string(),
            description: description.map(str::to_string),
            url: url.to_string(),
            ..Article::default()
        }
    }

    #[test]
    fn test_feed_response_deserialization() {
        let json = r#"{
            "pagination": {"limit": 5, "offset": 10, "count": 2, "total": 1234},
            "data": [
                {
                    "author": null,
                    "title": "Rates hold steady",
                    "description": "The central bank left rates unchanged.",
                    "url": "https://example.com/rates",
                    "source": "Example News",
                    "image": null,
                    "category": "business",
                    "language": "en",
                    "country": "us",
                    "published_at": "2024-03-01T10:22:00+00:00"
                },
                {
                    "author": "Jane Roe",
                    "title": null,
                    "description": null,
                    "url": "https://example.com/other",
                    "source": "Example News",
                    "image": "https://example.com/img.jpg",
                    "published_at": "2024-03-01T09:00:00+00:00"
                }
            ]
        }"#;

        let resp: FeedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.pagination.total, 1234);
        assert_eq!(resp.pagination.offset, 10);
        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.data[0].source, "Example News");
        assert_eq!(resp.data[0].author, None);
        assert!(!resp.data[0].bookmarked);
        assert_eq!(resp.data[1].title, "");
        assert_eq!(resp.data[1].description, None);
        assert_eq!(resp.data[1].image.as_deref(), Some("https://example.com/img.jpg"));
    }

    #[test]
    fn test_feed_response_requires_total() {
        let json = r#"{"pagination": {"limit": 5}, "data": []}"#;
        assert!(serde_json::from_str::<FeedResponse>(json).is_err());
    }

    #[test]
    fn test_same_bookmark_uses_description_only() {
        let a = article(Some("Same text"), "https://a.example", "A");
        let b = article(Some("Same text"), "https://b.example", "B");
        let c = article(Some("Other text"), "https://a.example", "A");
        assert!(a.same_bookmark(&b));
        assert!(!a.same_bookmark(&c));

        let none_1 = article(None, "https://x.example", "X");
        let none_2 = article(None, "https://y.example", "Y");
        assert!(none_1.same_bookmark(&none_2));
    }

    #[test]
    fn test_timestamp_prefix() {
        let mut a = Article::default();
        a.published_at = "2024-03-01T10:22:00+00:00".to_string();
        assert_eq!(a.timestamp_prefix(), "2024-03-01T10:22:00Z");
        assert_eq!(a.published_stamp(), "2024-03-01 10:22:00");
        let utc = a.published_at_utc().unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-03-01T10:22:00+00:00");
    }

    #[test]
    fn test_timestamp_prefix_malformed() {
        let mut a = Article::default();
        a.published_at = "2024-03".to_string();
        assert_eq!(a.timestamp_prefix(), "2024-03Z");
        assert_eq!(a.published_at_utc(), None);

        a.published_at = String::new();
        assert_eq!(a.timestamp_prefix(), "Z");
        assert_eq!(a.published_stamp(), "");
    }

    #[test]
    fn test_is_removed() {
        let removed = article(Some("[Removed]"), "https://removed.com", "[Removed]");
        assert!(removed.is_removed());
        let real = article(Some("x"), "https://example.com", "[Removed]");
        assert!(!real.is_removed());
    }

    #[test]
    fn test_sort_by_parse_and_display() {
        assert_eq!("popularity".parse::<SortBy>(), Ok(SortBy::Popularity));
        assert_eq!("published_asc".parse::<SortBy>(), Ok(SortBy::PublishedAsc));
        assert_eq!(SortBy::default(), SortBy::PublishedDesc);
        assert_eq!(SortBy::PublishedDesc.to_string(), "published_desc");
        assert!("relevancy".parse::<SortBy>().is_err());
        assert_eq!(serde_json::to_string(&SortBy::Popularity).unwrap(), "\"popularity\"");
    }

    #[test]
    fn test_total_pages_and_offset() {
        let mut state = SearchState::new(5);
        assert_eq!(state.total_pages(), 0);
        state.total_results = 11;
        assert_eq!(state.total_pages(), 3);
        state.total_results = 10;
        assert_eq!(state.total_pages(), 2);

        assert_eq!(state.offset_for(1), 0);
        assert_eq!(state.offset_for(3), 10);
        assert_eq!(state.offset_for(0), 0);
    }

    #[test]
    fn test_pagination_controls() {
        let mut state = SearchState::new(5);
        state.total_results = 12;

        state.page = 1;
        assert_eq!(
            state.pagination_controls(),
            PaginationControls { prev: None, next: Some(2) }
        );
        state.page = 2;
        assert_eq!(
            state.pagination_controls(),
            PaginationControls { prev: Some(1), next: Some(3) }
        );
        state.page = 3;
        assert_eq!(
            state.pagination_controls(),
            PaginationControls { prev: Some(2), next: None }
        );

        state.total_results = 4;
        state.page = 1;
        assert_eq!(state.pagination_controls(), PaginationControls::default());
    }
}
