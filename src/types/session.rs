use serde::{Deserialize, Serialize};

use super::history::HistoryEntry;
use super::settings::Settings;
use super::tab::Tab;

/// Tab session state as stored under the tabs key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub tabs: Vec<Tab>,
    pub active_tab_id: u64,
    /// Most-recent-first.
    #[serde(default)]
    pub closed_stack: Vec<Tab>,
}

/// Everything the persistence port writes in one go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session: SessionData,
    pub bookmarks: Vec<String>,
    pub history: Vec<HistoryEntry>,
    pub settings: Settings,
}

/// State read from local storage at bootstrap. Missing keys stay `None`/empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub session: Option<SessionData>,
    pub bookmarks: Vec<String>,
    pub history: Vec<HistoryEntry>,
    pub settings: Settings,
}
