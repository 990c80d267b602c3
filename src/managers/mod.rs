// Hideout state managers
// Managers handle stateful operations: tabs, bookmarks, history log, shortcuts.

pub mod bookmark_manager;
pub mod history_manager;
pub mod shortcut_manager;
pub mod tab_manager;
