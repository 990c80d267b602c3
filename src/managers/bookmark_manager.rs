//! Bookmark Manager for Hideout.
//!
//! A bounded, insertion-ordered set of bookmarked urls. When the set is full
//! the oldest bookmark is dropped to make room for the new one.

use tracing::debug;

/// Maximum number of bookmarks kept.
pub const MAX_BOOKMARKS: usize = 100;

/// Trait defining bookmark operations.
pub trait BookmarkManagerTrait {
    fn add_bookmark(&mut self, url: &str) -> bool;
    fn remove_bookmark(&mut self, url: &str) -> bool;
    fn toggle_bookmark(&mut self, url: &str) -> bool;
    fn is_bookmarked(&self, url: &str) -> bool;
    fn list_bookmarks(&self) -> &[String];
    fn search_bookmarks(&self, query: &str) -> Vec<&str>;
    fn bookmark_count(&self) -> usize;
}

/// In-memory bookmark set, oldest first.
#[derive(Debug, Clone, Default)]
pub struct BookmarkManager {
    urls: Vec<String>,
}

impl BookmarkManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the set from stored urls: blanks and duplicates are skipped and
    /// only the newest [`MAX_BOOKMARKS`] survive.
    pub fn restore(urls: Vec<String>) -> Self {
        let mut mgr = Self::new();
        for url in urls {
            mgr.add_bookmark(&url);
        }
        mgr
    }
}

impl BookmarkManagerTrait for BookmarkManager {
    /// Adds `url`. Returns false if it is blank or already bookmarked.
    fn add_bookmark(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || self.is_bookmarked(url) {
            return false;
        }
        if self.urls.len() >= MAX_BOOKMARKS {
            let evicted = self.urls.remove(0);
            debug!(url = %evicted, "Bookmark limit reached, dropping oldest");
        }
        self.urls.push(url.to_string());
        true
    }

    /// Removes `url`, keeping the order of the rest. Returns whether it was present.
    fn remove_bookmark(&mut self, url: &str) -> bool {
        let url = url.trim();
        match self.urls.iter().position(|u| u == url) {
            Some(idx) => {
                self.urls.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Adds or removes `url`; returns whether it is bookmarked afterwards.
    fn toggle_bookmark(&mut self, url: &str) -> bool {
        if self.remove_bookmark(url) {
            false
        } else {
            self.add_bookmark(url)
        }
    }

    fn is_bookmarked(&self, url: &str) -> bool {
        let url = url.trim();
        self.urls.iter().any(|u| u == url)
    }

    fn list_bookmarks(&self) -> &[String] {
        &self.urls
    }

    /// Case-insensitive substring match.
    fn search_bookmarks(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.urls
            .iter()
            .filter(|u| u.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    fn bookmark_count(&self) -> usize {
        self.urls.len()
    }
}
