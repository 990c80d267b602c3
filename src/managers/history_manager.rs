//! History Manager for Hideout.
//!
//! The global browsing history log: newest-first, one entry per url (the first
//! visit wins), capped at [`MAX_HISTORY_ENTRIES`] with the oldest evicted.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::history::HistoryEntry;
use crate::types::page::INTERNAL_SCHEME;

/// Maximum number of entries kept in the log.
pub const MAX_HISTORY_ENTRIES: usize = 500;

/// Trait defining history log operations.
pub trait HistoryManagerTrait {
    fn record_visit(&mut self, url: &str, title: &str) -> bool;
    fn record_visit_at(&mut self, url: &str, title: &str, timestamp: i64) -> bool;
    fn search_history(&self, query: &str) -> Vec<&HistoryEntry>;
    fn list_history(&self) -> &[HistoryEntry];
    fn delete_entry(&mut self, url: &str) -> bool;
    fn clear_all(&mut self);
    fn is_recording_enabled(&self) -> bool;
    fn set_recording_enabled(&mut self, enabled: bool);
}

/// In-memory history log.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    recording_enabled: bool,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            recording_enabled: true,
        }
    }

    /// Rebuilds the log from stored entries (assumed newest-first), dropping
    /// duplicate urls after their first occurrence and anything past the cap.
    pub fn restore(entries: Vec<HistoryEntry>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.url.clone()))
            .take(MAX_HISTORY_ENTRIES)
            .collect();
        Self {
            entries,
            recording_enabled: true,
        }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManagerTrait for HistoryManager {
    fn record_visit(&mut self, url: &str, title: &str) -> bool {
        self.record_visit_at(url, title, Self::now())
    }

    /// Adds an entry at the front. Returns false when the url is already in the
    /// log, is an internal page, or recording is disabled.
    fn record_visit_at(&mut self, url: &str, title: &str, timestamp: i64) -> bool {
        if !self.recording_enabled || url.is_empty() || url.starts_with(INTERNAL_SCHEME) {
            return false;
        }
        if self.entries.iter().any(|e| e.url == url) {
            return false;
        }
        self.entries.insert(
            0,
            HistoryEntry {
                url: url.to_string(),
                title: title.to_string(),
                timestamp,
            },
        );
        self.entries.truncate(MAX_HISTORY_ENTRIES);
        true
    }

    /// Case-insensitive substring match on url or title, newest first.
    fn search_history(&self, query: &str) -> Vec<&HistoryEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.url.to_lowercase().contains(&needle) || e.title.to_lowercase().contains(&needle)
            })
            .collect()
    }

    fn list_history(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn delete_entry(&mut self, url: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.url != url);
        self.entries.len() != before
    }

    fn clear_all(&mut self) {
        self.entries.clear();
    }

    fn is_recording_enabled(&self) -> bool {
        self.recording_enabled
    }

    fn set_recording_enabled(&mut self, enabled: bool) {
        self.recording_enabled = enabled;
    }
}
