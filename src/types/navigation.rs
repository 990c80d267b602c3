use serde::{Deserialize, Serialize};

use super::errors::NavigationError;

/// Per-tab back/forward stack.
///
/// `history_index` is `-1` exactly when `history` is empty, otherwise it points
/// at the current entry. Serialized field-for-field as `history` and
/// `historyIndex` so it can be flattened into a persisted tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationHistory {
    history: Vec<String>,
    history_index: i64,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            history_index: -1,
        }
    }

    /// Builds a history from stored parts, repairing an out-of-range index.
    pub fn from_parts(history: Vec<String>, history_index: i64) -> Self {
        let mut nav = Self {
            history,
            history_index,
        };
        nav.repair();
        nav
    }

    pub fn entries(&self) -> &[String] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Raw index, `-1` when empty.
    pub fn history_index(&self) -> i64 {
        self.history_index
    }

    /// The current entry, if any.
    pub fn current(&self) -> Option<&str> {
        usize::try_from(self.history_index)
            .ok()
            .and_then(|i| self.history.get(i))
            .map(String::as_str)
    }

    /// Records a new navigation, discarding any forward entries.
    pub fn push(&mut self, url: &str) {
        let keep = usize::try_from(self.history_index + 1).unwrap_or(0);
        self.history.truncate(keep);
        self.history.push(url.to_string());
        self.history_index = self.history.len() as i64 - 1;
    }

    /// Steps back one entry and returns the url now current.
    pub fn back(&mut self) -> Result<&str, NavigationError> {
        if !self.can_go_back() {
            return Err(NavigationError::NoHistory);
        }
        self.history_index -= 1;
        self.current().ok_or(NavigationError::NoHistory)
    }

    /// Steps forward one entry and returns the url now current.
    pub fn forward(&mut self) -> Result<&str, NavigationError> {
        if !self.can_go_forward() {
            return Err(NavigationError::NoHistory);
        }
        self.history_index += 1;
        self.current().ok_or(NavigationError::NoHistory)
    }

    pub fn can_go_back(&self) -> bool {
        self.history_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.history_index >= 0 && self.history_index < self.history.len() as i64 - 1
    }

    /// True when the index invariant holds.
    pub fn is_consistent(&self) -> bool {
        if self.history.is_empty() {
            self.history_index == -1
        } else {
            self.history_index >= 0 && (self.history_index as usize) < self.history.len()
        }
    }

    /// Clamps the index back into range: last entry when out of bounds, `-1` when empty.
    pub fn repair(&mut self) {
        if self.history.is_empty() {
            self.history_index = -1;
        } else if !self.is_consistent() {
            self.history_index = self.history.len() as i64 - 1;
        }
    }
}
