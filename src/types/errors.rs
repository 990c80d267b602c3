use thiserror::Error;

// === TabError ===

/// Errors related to tab session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TabError {
    /// Tab with the given ID was not found.
    #[error("Tab not found: {0}")]
    NotFound(u64),
    /// The session already holds the maximum number of open tabs.
    #[error("Tab limit reached: at most {limit} tabs can be open")]
    TabLimitReached { limit: usize },
}

// === NavigationError ===

/// Errors related to per-tab back/forward navigation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// There is no entry in the requested direction.
    #[error("No history entry in that direction")]
    NoHistory,
    /// The tab the navigation was addressed to no longer exists.
    #[error("Tab not found: {0}")]
    TabNotFound(u64),
}

// === ResolutionError ===

/// Errors produced while turning address bar input into a destination.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The input used the internal scheme with a page name that does not exist.
    #[error("Unknown internal page: {0}")]
    UnknownInternalPage(String),
    /// The input was empty after trimming.
    #[error("Nothing to resolve: input is empty")]
    EmptyInput,
    /// The input named a scheme the proxy cannot fetch.
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

// === ProxyError ===

/// Errors returned by the proxy fetch client.
///
/// Every variant is surfaced as an inline banner on the affected tab.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The request never produced a usable HTTP response.
    #[error("Proxy transport error: {0}")]
    Transport(String),
    /// The collaborator answered with something other than HTTP 200.
    #[error("Proxy returned HTTP {0}")]
    Status(u16),
    /// The collaborator reported `success: false`.
    #[error("Proxy could not load the page: {0}")]
    Rejected(String),
    /// The payload could not be decoded or lacked the `html` field.
    #[error("Malformed proxy response: {0}")]
    Malformed(String),
}

impl ProxyError {
    /// Returns the human-readable message shown in the tab's error banner.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

// === PersistenceError ===

/// Errors related to the local durable key space.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Database operation failed.
    #[error("Persistence database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Failed to serialize or deserialize a stored value.
    #[error("Persistence serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The background writer is no longer running.
    #[error("Persistence writer stopped")]
    WriterStopped,
}

// === SyncError ===

/// Errors related to the remote mirror. Never fatal: callers log and move on.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request failed before a response arrived.
    #[error("Sync transport error: {0}")]
    Transport(String),
    /// The remote store answered with a non-success status.
    #[error("Sync rejected with HTTP {0}")]
    Status(u16),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === ShortcutError ===

/// Errors related to keyboard shortcut management.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    /// No binding exists for the given key.
    #[error("Shortcut not found for key: {0}")]
    NotFound(String),
    /// The key is already bound to another command.
    #[error("Shortcut conflict: {0}")]
    Conflict(String),
    /// The provided key name is invalid.
    #[error("Invalid shortcut keys: {0}")]
    InvalidKeys(String),
}

// === ConfigError ===

/// Errors related to loading the application configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid JSON for `AppConfig`.
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value in the configuration is out of range or malformed.
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

// === BrowserError ===

/// Errors returned by the browser orchestrator's commands.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BrowserError {
    #[error(transparent)]
    Tab(#[from] TabError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl BrowserError {
    /// True when the error should surface as the tab-limit dialog.
    pub fn is_tab_limit(&self) -> bool {
        matches!(self, BrowserError::Tab(TabError::TabLimitReached { .. }))
    }
}
