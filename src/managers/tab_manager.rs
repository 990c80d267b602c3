//! Tab Session Manager for Hideout.
//!
//! Owns the ordered tab list, the active-tab pointer, the recently-closed stack
//! and the per-tab request sequence numbers that guard against stale fetches.
//! Every tab mutation goes through the command set on [`TabManagerTrait`];
//! other components refer to tabs by id only.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info, warn};
use url::Url;

use crate::types::errors::{NavigationError, ProxyError, TabError};
use crate::types::page::{Destination, InternalPage, SanitizedPage};
use crate::types::session::SessionData;
use crate::types::tab::{LoadState, Tab, TabKind};

/// Maximum number of simultaneously open tabs.
pub const MAX_TABS: usize = 5;
/// Maximum number of entries kept on the recently-closed stack.
pub const MAX_CLOSED_TABS: usize = 10;
/// Restored ids must leave at least this many ids free for new tabs; sessions
/// that don't are renumbered from 1.
const ID_HEADROOM: u64 = 1 << 32;

/// How a completed load affects the tab's navigation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// A new navigation: pushed onto history once it succeeds.
    Push,
    /// Reload or back/forward: history already points at the url.
    Revisit,
}

/// Handle for one in-flight fetch. A completion is applied only while the
/// tab's expected sequence still equals `sequence`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub tab_id: u64,
    pub sequence: u64,
    pub url: String,
    pub kind: LoadKind,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was applied to the tab.
    Applied,
    /// The fetch failed; the tab now shows an error banner with a retry action.
    Failed(ProxyError),
    /// The tab is gone or a newer navigation superseded this one.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Next,
    Previous,
}

/// Trait defining the tab session command set.
pub trait TabManagerTrait {
    fn new_tab(&mut self) -> Result<u64, TabError>;
    fn duplicate_tab(&mut self, tab_id: u64) -> Result<u64, TabError>;
    fn close_tab(&mut self, tab_id: u64) -> Result<bool, TabError>;
    fn close_others(&mut self, tab_id: u64) -> Result<usize, TabError>;
    fn close_to_right(&mut self, tab_id: u64) -> Result<usize, TabError>;
    fn close_all(&mut self) -> u64;
    fn toggle_pin(&mut self, tab_id: u64) -> Result<bool, TabError>;
    fn reopen_closed(&mut self) -> Result<Option<u64>, TabError>;
    fn select_tab(&mut self, tab_id: u64) -> Result<(), TabError>;
    fn cycle_tab(&mut self, direction: CycleDirection) -> u64;
    fn navigate(&mut self, tab_id: u64, destination: &Destination) -> Result<Option<LoadTicket>, TabError>;
    fn go_back(&mut self, tab_id: u64) -> Result<Option<LoadTicket>, NavigationError>;
    fn go_forward(&mut self, tab_id: u64) -> Result<Option<LoadTicket>, NavigationError>;
    fn reload(&mut self, tab_id: u64) -> Result<Option<LoadTicket>, TabError>;
    fn stop(&mut self, tab_id: u64) -> Result<bool, TabError>;
    fn complete_load(&mut self, ticket: &LoadTicket, result: Result<SanitizedPage, ProxyError>) -> LoadOutcome;
    fn get_tab(&self, tab_id: u64) -> Option<&Tab>;
    fn get_all_tabs(&self) -> &[Tab];
    fn get_active_tab(&self) -> &Tab;
    fn active_tab_id(&self) -> u64;
    fn tab_count(&self) -> usize;
    fn closed_tabs(&self) -> Vec<&Tab>;
}

/// In-memory tab session.
pub struct TabManager {
    tabs: Vec<Tab>,
    active_tab_id: u64,
    /// Most-recent-first.
    closed: VecDeque<Tab>,
    next_id: u64,
    /// Expected request sequence per tab.
    sequences: HashMap<u64, u64>,
}

impl TabManager {
    /// A session holding one empty tab.
    pub fn new() -> Self {
        let first = Tab::empty(1);
        Self {
            active_tab_id: first.id,
            tabs: vec![first],
            closed: VecDeque::new(),
            next_id: 2,
            sequences: HashMap::new(),
        }
    }

    /// Rebuilds a session from persisted data, enforcing every session invariant:
    /// at most [`MAX_TABS`] tabs, never empty, unique ids, a valid active tab and
    /// histories whose index and url agree.
    pub fn restore(data: SessionData) -> Self {
        let mut seen = HashSet::new();
        let mut tabs: Vec<Tab> = data
            .tabs
            .into_iter()
            .filter(|t| seen.insert(t.id))
            .take(MAX_TABS)
            .map(Self::repaired)
            .collect();

        let mut closed: VecDeque<Tab> = data
            .closed_stack
            .into_iter()
            .take(MAX_CLOSED_TABS)
            .map(Self::repaired)
            .collect();

        let mut active_idx = tabs.iter().position(|t| t.id == data.active_tab_id);

        let max_id = tabs
            .iter()
            .chain(closed.iter())
            .map(|t| t.id)
            .max()
            .unwrap_or(0);
        let mut next_id = match max_id.checked_add(ID_HEADROOM) {
            Some(_) => max_id + 1,
            None => {
                warn!(max_id, "Stored tab ids exhausted, renumbering session");
                let mut id = 0;
                for tab in tabs.iter_mut().chain(closed.iter_mut()) {
                    id += 1;
                    tab.id = id;
                }
                id + 1
            }
        };

        if tabs.is_empty() {
            tabs.push(Tab::empty(next_id));
            next_id += 1;
            active_idx = None;
        }

        let active_tab_id = tabs[active_idx.unwrap_or(0)].id;

        info!(tabs = tabs.len(), closed = closed.len(), "Restored tab session");

        Self {
            tabs,
            active_tab_id,
            closed,
            next_id,
            sequences: HashMap::new(),
        }
    }

    /// Serializable view of the session.
    pub fn snapshot(&self) -> SessionData {
        SessionData {
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id,
            closed_stack: self.closed.iter().cloned().collect(),
        }
    }

    /// Sets a tab's title directly, e.g. after the sandbox reports `document.title`.
    pub fn update_tab_title(&mut self, tab_id: u64, title: &str) -> Result<(), TabError> {
        let tab = self.tab_mut(tab_id)?;
        tab.title = title.to_string();
        Ok(())
    }

    /// The sequence number a completion must carry to be applied.
    pub fn expected_sequence(&self, tab_id: u64) -> u64 {
        self.sequences.get(&tab_id).copied().unwrap_or(0)
    }

    fn repaired(mut tab: Tab) -> Tab {
        tab.navigation.repair();
        tab.sync_url();
        tab.load_state = LoadState::Idle;
        tab
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn find_index(&self, tab_id: u64) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    fn index_of(&self, tab_id: u64) -> Result<usize, TabError> {
        self.find_index(tab_id).ok_or(TabError::NotFound(tab_id))
    }

    fn tab_mut(&mut self, tab_id: u64) -> Result<&mut Tab, TabError> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or(TabError::NotFound(tab_id))
    }

    fn ensure_capacity(&self) -> Result<(), TabError> {
        if self.tabs.len() >= MAX_TABS {
            return Err(TabError::TabLimitReached { limit: MAX_TABS });
        }
        Ok(())
    }

    /// Moves a removed tab onto the closed stack, evicting the oldest entry.
    fn push_closed(&mut self, mut tab: Tab) {
        self.sequences.remove(&tab.id);
        tab.rendered_content = None;
        tab.load_state = LoadState::Idle;
        self.closed.push_front(tab);
        self.closed.truncate(MAX_CLOSED_TABS);
    }

    /// Marks whatever the tab is fetching as abandoned.
    fn abandon(&mut self, tab_id: u64) -> u64 {
        let seq = self.sequences.entry(tab_id).or_insert(0);
        *seq += 1;
        *seq
    }

    fn begin_load(&mut self, tab_id: u64, url: &str, kind: LoadKind) -> Result<LoadTicket, TabError> {
        self.index_of(tab_id)?;
        let sequence = self.abandon(tab_id);
        let tab = self.tab_mut(tab_id)?;
        tab.load_state = LoadState::Loading {
            sequence,
            url: url.to_string(),
        };
        debug!(tab_id, sequence, url = %url, ?kind, "Load started");
        Ok(LoadTicket {
            tab_id,
            sequence,
            url: url.to_string(),
            kind,
        })
    }

    /// Shows an internal page in place, no fetch involved.
    fn show_internal(&mut self, tab_id: u64, page: InternalPage, push: bool) -> Result<(), TabError> {
        self.index_of(tab_id)?;
        self.abandon(tab_id);
        let tab = self.tab_mut(tab_id)?;
        if push {
            tab.commit(&page.url());
        }
        tab.rendered_content = None;
        tab.title = page.title().to_string();
        tab.load_state = LoadState::Idle;
        Ok(())
    }

    /// After back/forward moved the history index: render the new current entry.
    fn revisit_current(&mut self, tab_id: u64) -> Result<Option<LoadTicket>, TabError> {
        let tab = self.tab_mut(tab_id)?;
        tab.sync_url();
        let url = tab.url.clone();
        match tab.kind() {
            TabKind::Internal(page) => {
                self.show_internal(tab_id, page, false)?;
                Ok(None)
            }
            TabKind::Empty => {
                self.abandon(tab_id);
                Ok(None)
            }
            TabKind::Proxied => self.begin_load(tab_id, &url, LoadKind::Revisit).map(Some),
        }
    }

    fn fallback_title(url: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string())
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabManagerTrait for TabManager {
    /// Appends an empty tab and activates it.
    fn new_tab(&mut self) -> Result<u64, TabError> {
        self.ensure_capacity()?;
        let id = self.allocate_id();
        self.tabs.push(Tab::empty(id));
        self.active_tab_id = id;
        debug!(tab_id = id, "Tab created");
        Ok(id)
    }

    /// Copies a tab (history and pin state included) right after the source and
    /// activates the copy. Rendered content is not copied.
    fn duplicate_tab(&mut self, tab_id: u64) -> Result<u64, TabError> {
        let idx = self.index_of(tab_id)?;
        self.ensure_capacity()?;
        let id = self.allocate_id();
        let copy = self.tabs[idx].duplicate_as(id);
        self.tabs.insert(idx + 1, copy);
        self.active_tab_id = id;
        debug!(source = tab_id, tab_id = id, "Tab duplicated");
        Ok(id)
    }

    /// Closes a tab. Returns `Ok(false)` without doing anything when it is the
    /// only tab left.
    fn close_tab(&mut self, tab_id: u64) -> Result<bool, TabError> {
        let idx = self.index_of(tab_id)?;
        if self.tabs.len() == 1 {
            debug!(tab_id, "Refusing to close the last tab");
            return Ok(false);
        }

        let tab = self.tabs.remove(idx);
        self.push_closed(tab);

        if self.active_tab_id == tab_id {
            let new_idx = idx.min(self.tabs.len() - 1);
            self.active_tab_id = self.tabs[new_idx].id;
        }
        debug!(tab_id, "Tab closed");
        Ok(true)
    }

    /// Closes every tab except `tab_id`, which becomes active.
    fn close_others(&mut self, tab_id: u64) -> Result<usize, TabError> {
        self.index_of(tab_id)?;
        let (keep, removed): (Vec<Tab>, Vec<Tab>) =
            std::mem::take(&mut self.tabs).into_iter().partition(|t| t.id == tab_id);
        self.tabs = keep;
        let count = removed.len();
        for tab in removed {
            self.push_closed(tab);
        }
        self.active_tab_id = tab_id;
        Ok(count)
    }

    /// Closes every tab to the right of `tab_id`. No-op when it is already last.
    fn close_to_right(&mut self, tab_id: u64) -> Result<usize, TabError> {
        let idx = self.index_of(tab_id)?;
        if idx + 1 >= self.tabs.len() {
            return Ok(0);
        }
        let removed: Vec<Tab> = self.tabs.drain(idx + 1..).collect();
        let count = removed.len();
        let active_removed = removed.iter().any(|t| t.id == self.active_tab_id);
        for tab in removed {
            self.push_closed(tab);
        }
        if active_removed {
            self.active_tab_id = tab_id;
        }
        Ok(count)
    }

    /// Closes everything and starts over with one empty tab. Returns its id.
    fn close_all(&mut self) -> u64 {
        for tab in std::mem::take(&mut self.tabs) {
            self.push_closed(tab);
        }
        let id = self.allocate_id();
        self.tabs.push(Tab::empty(id));
        self.active_tab_id = id;
        info!(tab_id = id, "All tabs closed");
        id
    }

    /// Flips the pinned flag and returns the new value.
    fn toggle_pin(&mut self, tab_id: u64) -> Result<bool, TabError> {
        let tab = self.tab_mut(tab_id)?;
        tab.pinned = !tab.pinned;
        Ok(tab.pinned)
    }

    /// Reopens the most recently closed tab under a fresh id.
    fn reopen_closed(&mut self) -> Result<Option<u64>, TabError> {
        if self.closed.is_empty() {
            return Ok(None);
        }
        self.ensure_capacity()?;
        let Some(closed) = self.closed.pop_front() else {
            return Ok(None);
        };
        let id = self.allocate_id();
        self.tabs.push(closed.duplicate_as(id));
        self.active_tab_id = id;
        debug!(tab_id = id, url = %closed.url, "Closed tab reopened");
        Ok(Some(id))
    }

    fn select_tab(&mut self, tab_id: u64) -> Result<(), TabError> {
        self.index_of(tab_id)?;
        self.active_tab_id = tab_id;
        Ok(())
    }

    /// Activates the neighbouring tab, wrapping at both ends.
    fn cycle_tab(&mut self, direction: CycleDirection) -> u64 {
        let len = self.tabs.len();
        let idx = self.find_index(self.active_tab_id).unwrap_or(0);
        let next = match direction {
            CycleDirection::Next => (idx + 1) % len,
            CycleDirection::Previous => (idx + len - 1) % len,
        };
        self.active_tab_id = self.tabs[next].id;
        self.active_tab_id
    }

    /// Starts navigating `tab_id` to `destination`. Internal pages are shown
    /// immediately and return no ticket.
    fn navigate(&mut self, tab_id: u64, destination: &Destination) -> Result<Option<LoadTicket>, TabError> {
        match destination {
            Destination::Internal(page) => {
                self.show_internal(tab_id, *page, true)?;
                Ok(None)
            }
            Destination::Search(url) | Destination::Direct(url) => {
                self.begin_load(tab_id, url, LoadKind::Push).map(Some)
            }
        }
    }

    fn go_back(&mut self, tab_id: u64) -> Result<Option<LoadTicket>, NavigationError> {
        let tab = self
            .tab_mut(tab_id)
            .map_err(|_| NavigationError::TabNotFound(tab_id))?;
        tab.navigation.back()?;
        self.revisit_current(tab_id)
            .map_err(|_| NavigationError::TabNotFound(tab_id))
    }

    fn go_forward(&mut self, tab_id: u64) -> Result<Option<LoadTicket>, NavigationError> {
        let tab = self
            .tab_mut(tab_id)
            .map_err(|_| NavigationError::TabNotFound(tab_id))?;
        tab.navigation.forward()?;
        self.revisit_current(tab_id)
            .map_err(|_| NavigationError::TabNotFound(tab_id))
    }

    /// Re-fetches the current page, or retries a failed navigation.
    fn reload(&mut self, tab_id: u64) -> Result<Option<LoadTicket>, TabError> {
        let tab = self.get_tab(tab_id).ok_or(TabError::NotFound(tab_id))?;
        let retry = match &tab.load_state {
            LoadState::Failed { url, .. } if *url != tab.url => Some(url.clone()),
            _ => None,
        };
        if let Some(url) = retry {
            return self.begin_load(tab_id, &url, LoadKind::Push).map(Some);
        }
        match tab.kind() {
            TabKind::Proxied => {
                let url = tab.url.clone();
                self.begin_load(tab_id, &url, LoadKind::Revisit).map(Some)
            }
            TabKind::Internal(page) => {
                self.show_internal(tab_id, page, false)?;
                Ok(None)
            }
            TabKind::Empty => Ok(None),
        }
    }

    /// Abandons the tab's in-flight fetch. Returns whether one was running.
    fn stop(&mut self, tab_id: u64) -> Result<bool, TabError> {
        let loading = self
            .get_tab(tab_id)
            .ok_or(TabError::NotFound(tab_id))?
            .is_loading();
        if loading {
            let sequence = self.abandon(tab_id);
            self.tab_mut(tab_id)?.load_state = LoadState::Idle;
            debug!(tab_id, sequence, "Load stopped");
        }
        Ok(loading)
    }

    /// Applies a finished fetch if it is still the tab's latest request.
    fn complete_load(&mut self, ticket: &LoadTicket, result: Result<SanitizedPage, ProxyError>) -> LoadOutcome {
        let expected = self.expected_sequence(ticket.tab_id);
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == ticket.tab_id) else {
            debug!(tab_id = ticket.tab_id, sequence = ticket.sequence, "Dropping response for closed tab");
            return LoadOutcome::Stale;
        };
        if ticket.sequence != expected {
            debug!(
                tab_id = ticket.tab_id,
                sequence = ticket.sequence,
                expected,
                url = %ticket.url,
                "Dropping stale response"
            );
            return LoadOutcome::Stale;
        }
        if ticket.kind == LoadKind::Revisit && tab.url != ticket.url {
            return LoadOutcome::Stale;
        }

        match result {
            Ok(page) => {
                if ticket.kind == LoadKind::Push {
                    tab.commit(&ticket.url);
                }
                tab.title = page
                    .title
                    .unwrap_or_else(|| Self::fallback_title(&ticket.url));
                tab.rendered_content = Some(page.html);
                tab.load_state = LoadState::Idle;
                debug!(tab_id = ticket.tab_id, sequence = ticket.sequence, url = %ticket.url, "Load applied");
                LoadOutcome::Applied
            }
            Err(err) => {
                tab.load_state = LoadState::Failed {
                    url: ticket.url.clone(),
                    message: err.message(),
                };
                info!(tab_id = ticket.tab_id, url = %ticket.url, error = %err, "Load failed");
                LoadOutcome::Failed(err)
            }
        }
    }

    fn get_tab(&self, tab_id: u64) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    fn get_all_tabs(&self) -> &[Tab] {
        &self.tabs
    }

    fn get_active_tab(&self) -> &Tab {
        self.get_tab(self.active_tab_id).unwrap_or(&self.tabs[0])
    }

    fn active_tab_id(&self) -> u64 {
        self.active_tab_id
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn closed_tabs(&self) -> Vec<&Tab> {
        self.closed.iter().collect()
    }
}
