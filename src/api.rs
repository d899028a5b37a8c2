//! News feed client.
//!
//! The session talks to the feed through the [`NewsFeed`] trait so the
//! transport can be swapped out (tests use scripted feeds). The production
//! implementation is [`MediastackClient`], a thin `reqwest` wrapper around the
//! Mediastack `/v1/news` endpoint.
//!
//! # Request
//!
//! ```text
//! GET {base_url}?access_key=..&keywords=..&sort=..&offset=..&limit=..&languages=..&countries=..
//! ```
//!
//! Timeouts are not handled here; the session races [`NewsFeed::fetch`]
//! against a timer (see [`crate::timeout`]).

use crate::config::NewsConfig;
use crate::errors::SearchError;
use crate::models::{FeedResponse, SortBy};
use crate::utils::truncate_for_log;
use reqwest::Client;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// One windowed query against the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub keywords: String,
    pub sort: SortBy,
    /// Zero-based index of the first result.
    pub offset: u64,
    pub limit: u32,
}

/// Something that can answer a [`FeedRequest`].
pub trait NewsFeed {
    /// Fetch one page of articles.
    ///
    /// Non-success statuses and undecodable bodies are errors; an empty
    /// `data` array is not.
    async fn fetch(&self, request: &FeedRequest) -> Result<FeedResponse, SearchError>;
}

/// [`NewsFeed`] backed by the Mediastack HTTP API.
pub struct MediastackClient {
    http: Client,
    base_url: Url,
    access_key: String,
    languages: String,
    countries: String,
}

impl std::fmt::Debug for MediastackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediastackClient")
            .field("base_url", &self.base_url.as_str())
            .field("languages", &self.languages)
            .field("countries", &self.countries)
            .finish()
    }
}

impl MediastackClient {
    pub fn new(config: &NewsConfig) -> Result<Self, Box<dyn Error>> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            access_key: config.access_key.clone(),
            languages: config.languages.clone(),
            countries: config.countries.clone(),
        })
    }

    /// Full request URL for `request`, access key included.
    pub fn request_url(&self, request: &FeedRequest) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("access_key", &self.access_key)
            .append_pair("keywords", &request.keywords)
            .append_pair("sort", request.sort.as_param())
            .append_pair("offset", &request.offset.to_string())
            .append_pair("limit", &request.limit.to_string())
            .append_pair("languages", &self.languages)
            .append_pair("countries", &self.countries);
        url
    }
}

impl NewsFeed for MediastackClient {
    #[instrument(
        level = "info",
        skip_all,
        fields(keywords = %request.keywords, sort = %request.sort, offset = request.offset, limit = request.limit)
    )]
    async fn fetch(&self, request: &FeedRequest) -> Result<FeedResponse, SearchError> {
        let t0 = Instant::now();
        let url = self.request_url(request);

        let response = self.http.get(url).send().await.map_err(|e| {
            error!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "Feed request failed");
            SearchError::from(e)
        })?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), elapsed_ms = t0.elapsed().as_millis(), "Feed responded");

        if !status.is_success() {
            let message = upstream_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            error!(status = status.as_u16(), %message, "Feed returned an error status");
            return Err(SearchError::Http {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str::<FeedResponse>(&body) {
            Ok(page) => {
                info!(
                    count = page.data.len(),
                    reported_count = page.pagination.count,
                    reported_offset = page.pagination.offset,
                    reported_limit = page.pagination.limit,
                    total = page.pagination.total,
                    elapsed_ms = t0.elapsed().as_millis(),
                    "Decoded feed page"
                );
                Ok(page)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&body, 300),
                    "Feed returned a non-conforming body"
                );
                Err(SearchError::Decode(e.to_string()))
            }
        }
    }
}

/// Message carried by an error body: `{"error": {"message": ..}}` or
/// `{"message": ..}`.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
