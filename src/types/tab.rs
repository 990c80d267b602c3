use serde::{Deserialize, Serialize};

use super::navigation::NavigationHistory;
use super::page::InternalPage;

/// Title given to tabs that have not loaded anything yet.
pub const NEW_TAB_TITLE: &str = "New Tab";

/// Represents a browser tab with its current state.
///
/// Persisted field-for-field (camelCase). `load_state` is runtime-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub rendered_content: Option<String>,
    #[serde(flatten)]
    pub navigation: NavigationHistory,
    #[serde(default)]
    pub pinned: bool,
    #[serde(skip)]
    pub load_state: LoadState,
}

/// What a tab is currently showing, derived from its url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Empty,
    Internal(InternalPage),
    Proxied,
}

/// Progress of the tab's latest fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading { sequence: u64, url: String },
    /// The last load failed; `url` is what a retry would fetch.
    Failed { url: String, message: String },
}

impl Tab {
    /// A fresh tab with no history.
    pub fn empty(id: u64) -> Self {
        Self {
            id,
            title: NEW_TAB_TITLE.to_string(),
            url: String::new(),
            rendered_content: None,
            navigation: NavigationHistory::new(),
            pinned: false,
            load_state: LoadState::Idle,
        }
    }

    pub fn kind(&self) -> TabKind {
        if self.url.is_empty() {
            TabKind::Empty
        } else if let Some(page) = InternalPage::from_url(&self.url) {
            TabKind::Internal(page)
        } else {
            TabKind::Proxied
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.navigation.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.navigation.can_go_forward()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load_state, LoadState::Loading { .. })
    }

    /// Records a new navigation and points `url` at it.
    pub fn commit(&mut self, url: &str) {
        self.navigation.push(url);
        self.url = url.to_string();
    }

    /// Re-aligns `url` with the current history entry.
    pub fn sync_url(&mut self) {
        self.url = self.navigation.current().unwrap_or_default().to_string();
    }

    /// Copy of this tab under a new id, without rendered content or load state.
    pub fn duplicate_as(&self, id: u64) -> Self {
        Self {
            id,
            title: self.title.clone(),
            url: self.url.clone(),
            rendered_content: None,
            navigation: self.navigation.clone(),
            pinned: self.pinned,
            load_state: LoadState::Idle,
        }
    }
}
