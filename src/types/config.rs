use serde::{Deserialize, Serialize};

/// Process-level configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Fetch-and-rewrite collaborator endpoint that accepts `{url}` POSTs.
    pub proxy_endpoint: String,
    /// Base url of the remote mirror; remote sync is off when unset.
    pub sync_endpoint: Option<String>,
    /// Quiet period before a scheduled save is written.
    pub save_debounce_ms: u64,
    pub fetch_timeout_secs: u64,
    /// Key that arms the shortcut dispatcher while held.
    pub modifier_key: String,
    /// Directory holding `hideout.db`; the platform data dir when unset.
    pub data_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            proxy_endpoint: "http://127.0.0.1:8080/api/proxy".to_string(),
            sync_endpoint: None,
            save_debounce_ms: 1000,
            fetch_timeout_secs: 30,
            modifier_key: "Alt".to_string(),
            data_dir: None,
        }
    }
}
