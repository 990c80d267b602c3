//! Shortcut Manager for Hideout.
//!
//! A small modal dispatcher: bindings only fire while the designated modifier
//! key is held ("armed"). Each physical key-down fires at most once; repeats
//! are swallowed until the key is released.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::errors::ShortcutError;

/// Session commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutCommand {
    NewTab,
    CloseTab,
    ReopenClosedTab,
    Reload,
    Stop,
    FocusAddressBar,
    Back,
    Forward,
    NextTab,
    PreviousTab,
    ToggleDevOverlay,
    ToggleFullscreen,
}

/// Trait defining shortcut dispatch and binding operations.
pub trait ShortcutManagerTrait {
    fn key_down(&mut self, key: &str) -> Option<ShortcutCommand>;
    fn key_up(&mut self, key: &str);
    fn release_all(&mut self);
    fn is_armed(&self) -> bool;
    fn register_shortcut(&mut self, key: &str, command: ShortcutCommand) -> Result<(), ShortcutError>;
    fn unregister_shortcut(&mut self, key: &str) -> Result<(), ShortcutError>;
    fn get_shortcut(&self, key: &str) -> Option<ShortcutCommand>;
    fn list_shortcuts(&self) -> &HashMap<String, ShortcutCommand>;
    fn reset_to_defaults(&mut self);
    fn has_conflict(&self, key: &str, exclude: Option<ShortcutCommand>) -> Option<ShortcutCommand>;
    fn get_default_shortcuts(&self) -> HashMap<String, ShortcutCommand>;
}

/// Keyboard dispatcher with in-memory bindings.
pub struct ShortcutManager {
    modifier: String,
    shortcuts: HashMap<String, ShortcutCommand>,
    pressed: HashSet<String>,
}

impl ShortcutManager {
    /// Creates a dispatcher armed by `modifier` (e.g. `"Alt"`) with default bindings.
    pub fn new(modifier: &str) -> Self {
        let mut mgr = Self {
            modifier: Self::normalize(modifier),
            shortcuts: HashMap::new(),
            pressed: HashSet::new(),
        };
        mgr.shortcuts = mgr.get_default_shortcuts();
        mgr
    }

    pub fn modifier(&self) -> &str {
        &self.modifier
    }

    /// Key names compare case-insensitively: `"T"`, `"t"` and `" t "` are one key.
    fn normalize(key: &str) -> String {
        key.trim().to_ascii_lowercase()
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new("Alt")
    }
}

impl ShortcutManagerTrait for ShortcutManager {
    /// Handles a key-down event and returns the command to run, if any.
    fn key_down(&mut self, key: &str) -> Option<ShortcutCommand> {
        let key = Self::normalize(key);
        if key.is_empty() {
            return None;
        }
        let first_press = self.pressed.insert(key.clone());
        if key == self.modifier || !first_press || !self.is_armed() {
            return None;
        }
        self.shortcuts.get(&key).copied()
    }

    fn key_up(&mut self, key: &str) {
        self.pressed.remove(&Self::normalize(key));
    }

    /// Forgets every held key, e.g. when the window loses focus.
    fn release_all(&mut self) {
        self.pressed.clear();
    }

    fn is_armed(&self) -> bool {
        self.pressed.contains(&self.modifier)
    }

    /// Binds `key` to `command`, replacing the command's previous keys.
    fn register_shortcut(&mut self, key: &str, command: ShortcutCommand) -> Result<(), ShortcutError> {
        let key = Self::normalize(key);
        if key.is_empty() {
            return Err(ShortcutError::InvalidKeys("Keys cannot be empty".to_string()));
        }
        if key == self.modifier {
            return Err(ShortcutError::InvalidKeys(format!(
                "'{}' is the modifier key",
                key
            )));
        }
        if let Some(existing) = self.has_conflict(&key, Some(command)) {
            return Err(ShortcutError::Conflict(format!(
                "'{}' is already bound to '{:?}'",
                key, existing
            )));
        }
        self.shortcuts.retain(|_, c| *c != command);
        self.shortcuts.insert(key, command);
        Ok(())
    }

    fn unregister_shortcut(&mut self, key: &str) -> Result<(), ShortcutError> {
        let key = Self::normalize(key);
        self.shortcuts
            .remove(&key)
            .map(|_| ())
            .ok_or(ShortcutError::NotFound(key))
    }

    fn get_shortcut(&self, key: &str) -> Option<ShortcutCommand> {
        self.shortcuts.get(&Self::normalize(key)).copied()
    }

    fn list_shortcuts(&self) -> &HashMap<String, ShortcutCommand> {
        &self.shortcuts
    }

    fn reset_to_defaults(&mut self) {
        self.shortcuts = self.get_default_shortcuts();
    }

    fn has_conflict(&self, key: &str, exclude: Option<ShortcutCommand>) -> Option<ShortcutCommand> {
        let bound = *self.shortcuts.get(&Self::normalize(key))?;
        (Some(bound) != exclude).then_some(bound)
    }

    fn get_default_shortcuts(&self) -> HashMap<String, ShortcutCommand> {
        let defaults = [
            ("t", ShortcutCommand::NewTab),
            ("w", ShortcutCommand::CloseTab),
            ("x", ShortcutCommand::ReopenClosedTab),
            ("r", ShortcutCommand::Reload),
            ("s", ShortcutCommand::Stop),
            ("l", ShortcutCommand::FocusAddressBar),
            ("arrowleft", ShortcutCommand::Back),
            ("arrowright", ShortcutCommand::Forward),
            ("tab", ShortcutCommand::NextTab),
            ("]", ShortcutCommand::NextTab),
            ("[", ShortcutCommand::PreviousTab),
            ("i", ShortcutCommand::ToggleDevOverlay),
            ("f", ShortcutCommand::ToggleFullscreen),
        ];

        defaults
            .into_iter()
            .map(|(k, c)| (k.to_string(), c))
            .collect()
    }
}
