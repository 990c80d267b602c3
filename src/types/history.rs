use serde::{Deserialize, Serialize};

/// Represents a single history log entry for a visited page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    /// UNIX seconds of the first visit.
    pub timestamp: i64,
}
