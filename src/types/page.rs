use std::fmt;

/// Reserved scheme for locally rendered pages.
pub const INTERNAL_SCHEME: &str = "hideout://";

/// Locally rendered views that never go through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalPage {
    Help,
    Settings,
    History,
}

impl InternalPage {
    pub const ALL: [InternalPage; 3] = [Self::Help, Self::Settings, Self::History];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Settings => "settings",
            Self::History => "history",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Parses a full `hideout://<page>` url. Trailing slashes are ignored.
    pub fn from_url(url: &str) -> Option<Self> {
        let name = url.strip_prefix(INTERNAL_SCHEME)?;
        Self::from_name(name.trim_end_matches('/'))
    }

    pub fn url(&self) -> String {
        format!("{}{}", INTERNAL_SCHEME, self.name())
    }

    /// Tab title shown for the page.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Help => "Help",
            Self::Settings => "Settings",
            Self::History => "History",
        }
    }
}

impl fmt::Display for InternalPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a piece of address bar input leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A locally rendered page.
    Internal(InternalPage),
    /// A search engine results page for the query.
    Search(String),
    /// A direct http(s) url.
    Direct(String),
}

impl Destination {
    /// The url this destination navigates to.
    pub fn url(&self) -> String {
        match self {
            Self::Internal(page) => page.url(),
            Self::Search(url) | Self::Direct(url) => url.clone(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// A page as returned by the fetch-and-rewrite collaborator, ready for the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedPage {
    pub html: String,
    pub title: Option<String>,
}
