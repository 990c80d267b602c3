use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const DEFAULT_ZOOM: f64 = 1.0;

/// User-facing browser settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub search_engine: SearchEngine,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_engine: SearchEngine::default(),
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Search engine used for non-url input.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    DuckDuckGo,
    Bing,
    Yahoo,
    Yandex,
    Brave,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 6] = [
        Self::Google,
        Self::DuckDuckGo,
        Self::Bing,
        Self::Yahoo,
        Self::Yandex,
        Self::Brave,
    ];

    /// Results page template; `%s` is replaced by the percent-encoded query.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com/search?q=%s",
            Self::DuckDuckGo => "https://duckduckgo.com/?q=%s",
            Self::Bing => "https://www.bing.com/search?q=%s",
            Self::Yahoo => "https://search.yahoo.com/search?p=%s",
            Self::Yandex => "https://yandex.com/search/?text=%s",
            Self::Brave => "https://search.brave.com/search?q=%s",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::DuckDuckGo => "duckduckgo",
            Self::Bing => "bing",
            Self::Yahoo => "yahoo",
            Self::Yandex => "yandex",
            Self::Brave => "brave",
        }
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.name() == lower)
            .ok_or_else(|| format!("unknown search engine: {}", s))
    }
}
