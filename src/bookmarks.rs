//! Saved articles, persisted across sessions.
//!
//! The whole list is stored as one JSON array under [`BOOKMARKS_KEY`] and is
//! rewritten after every mutation. Bookmarking is best effort: storage or
//! decode failures are logged and never reach the caller.
//!
//! Identity is the article `description` (see [`Article::same_bookmark`]).

use crate::models::Article;
use crate::storage::KeyValueStore;
use tracing::{debug, info, instrument, warn};

pub const BOOKMARKS_KEY: &str = "bookmarks";

#[derive(Debug)]
pub struct BookmarkStore<S> {
    storage: S,
    bookmarks: Vec<Article>,
}

impl<S: KeyValueStore> BookmarkStore<S> {
    /// Read the persisted list. Missing or unreadable data yields an empty set.
    #[instrument(level = "info", skip_all)]
    pub fn load(storage: S) -> Self {
        let bookmarks = match storage.get(BOOKMARKS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Article>>(&raw) {
                Ok(mut list) => {
                    for article in &mut list {
                        article.bookmarked = true;
                    }
                    list
                }
                Err(e) => {
                    warn!(error = %e, "Persisted bookmarks are corrupt; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No persisted bookmarks");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Bookmark storage unavailable; starting empty");
                Vec::new()
            }
        };
        info!(count = bookmarks.len(), "Loaded bookmarks");
        Self { storage, bookmarks }
    }

    pub fn articles(&self) -> &[Article] {
        &self.bookmarks
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Hand back the storage, e.g. to load it again.
    #[cfg(test)]
    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn contains(&self, article: &Article) -> bool {
        self.bookmarks.iter().any(|b| b.same_bookmark(article))
    }

    /// Copy of `article` with `bookmarked` reflecting this store.
    pub fn mark(&self, article: &Article) -> Article {
        Article {
            bookmarked: self.contains(article),
            ..article.clone()
        }
    }

    /// Append `article` and persist. Does not check for an existing entry;
    /// callers go through [`toggle`](Self::toggle) or check
    /// [`contains`](Self::contains) first.
    pub fn add(&mut self, article: &mut Article) {
        article.bookmarked = true;
        self.bookmarks.push(article.clone());
        debug!(count = self.bookmarks.len(), "Bookmark added");
        self.persist();
    }

    /// Remove the first entry with the same description and persist.
    /// Returns `false`, touching nothing, when there is no such entry.
    pub fn remove(&mut self, article: &Article) -> bool {
        let Some(idx) = self.bookmarks.iter().position(|b| b.same_bookmark(article)) else {
            debug!("Nothing to remove");
            return false;
        };
        self.bookmarks.remove(idx);
        debug!(count = self.bookmarks.len(), "Bookmark removed");
        self.persist();
        true
    }

    /// Add or remove `article` and flip its `bookmarked` flag to match.
    pub fn toggle(&mut self, article: &mut Article) -> &[Article] {
        if self.contains(article) {
            self.remove(article);
            article.bookmarked = false;
        } else {
            self.add(article);
        }
        &self.bookmarks
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.bookmarks) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode bookmarks");
                return;
            }
        };
        if let Err(e) = self.storage.set(BOOKMARKS_KEY, &json) {
            warn!(error = %e, "Failed to persist bookmarks");
        }
    }
}
