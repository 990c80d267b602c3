//! Browser orchestrator for Hideout.
//!
//! [`Browser`] is the single owner of the session. Every user command is routed
//! through the managers here; fetches are the only suspension point and run as
//! spawned tasks that report back over a channel drained by
//! [`Browser::next_completion`]. Each mutation schedules a debounced save.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::managers::history_manager::{HistoryManager, HistoryManagerTrait};
use crate::managers::shortcut_manager::{ShortcutCommand, ShortcutManager, ShortcutManagerTrait};
use crate::managers::tab_manager::{CycleDirection, LoadOutcome, LoadTicket, TabManager, TabManagerTrait};
use crate::services::config_loader::database_path;
use crate::services::persistence::{load_state, PersistencePort, RemoteMirror};
use crate::services::proxy_client::{PageFetcher, ProxyClient};
use crate::services::remote_sync::HttpRemoteMirror;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::url_resolver;
use crate::types::config::AppConfig;
use crate::types::errors::{BrowserError, ProxyError, TabError};
use crate::types::page::SanitizedPage;
use crate::types::session::{PersistedState, SessionData, Snapshot};
use crate::types::settings::Settings;
use crate::types::tab::{Tab, TabKind};

/// Presentation side effects the host UI has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiEffect {
    FocusAddressBar,
    ToggleDevOverlay,
    ToggleFullscreen,
    /// Offer "close all" when a new tab would exceed the limit.
    ShowTabLimitDialog,
}

/// A shortcut that fired, and what the UI should do about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub command: ShortcutCommand,
    pub effect: Option<UiEffect>,
}

/// A fetch that finished and went through the stale-response guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEvent {
    pub tab_id: u64,
    pub url: String,
    pub outcome: LoadOutcome,
}

struct Completion {
    ticket: LoadTicket,
    result: Result<SanitizedPage, ProxyError>,
}

/// Central session owner.
pub struct Browser {
    tabs: TabManager,
    bookmarks: BookmarkManager,
    history: HistoryManager,
    settings: SettingsEngine,
    shortcuts: ShortcutManager,
    fetcher: Arc<dyn PageFetcher>,
    persistence: PersistencePort,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Browser {
    /// Builds a browser from already-loaded state. Restored tabs have no
    /// rendered content; call [`Browser::reload_all`] to fetch it again.
    pub fn new(
        state: PersistedState,
        fetcher: Arc<dyn PageFetcher>,
        persistence: PersistencePort,
        modifier_key: &str,
    ) -> Self {
        let tabs = match state.session {
            Some(session) => TabManager::restore(session),
            None => TabManager::new(),
        };
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        info!(
            tabs = tabs.tab_count(),
            bookmarks = state.bookmarks.len(),
            history = state.history.len(),
            "Session restored"
        );
        Self {
            tabs,
            bookmarks: BookmarkManager::restore(state.bookmarks),
            history: HistoryManager::restore(state.history),
            settings: SettingsEngine::new(state.settings),
            shortcuts: ShortcutManager::new(modifier_key),
            fetcher,
            persistence,
            completions_tx,
            completions_rx,
        }
    }

    /// Bootstrap sequence: open the database, read persisted state, wire the
    /// proxy client and (when configured) the remote mirror.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db_path = database_path(config);
        let db = Database::open(&db_path)?;
        info!(path = %db_path.display(), "Database opened");
        let state = load_state(&db)?;

        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        let fetcher = Arc::new(ProxyClient::new(config.proxy_endpoint.clone(), timeout)?);
        let remote: Option<Arc<dyn RemoteMirror>> = match &config.sync_endpoint {
            Some(endpoint) => Some(Arc::new(HttpRemoteMirror::new(endpoint.clone(), timeout)?)),
            None => None,
        };
        let persistence = PersistencePort::spawn(
            Box::new(db),
            remote,
            Duration::from_millis(config.save_debounce_ms),
        );

        Ok(Self::new(state, fetcher, persistence, &config.modifier_key))
    }

    // ─── Accessors ───

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn bookmarks(&self) -> &BookmarkManager {
        &self.bookmarks
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        self.settings.get_settings()
    }

    pub fn shortcuts(&self) -> &ShortcutManager {
        &self.shortcuts
    }

    pub fn shortcuts_mut(&mut self) -> &mut ShortcutManager {
        &mut self.shortcuts
    }

    pub fn active_tab(&self) -> &Tab {
        self.tabs.get_active_tab()
    }

    pub fn identity(&self) -> Option<&str> {
        self.persistence.identity()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session: self.tabs.snapshot(),
            bookmarks: self.bookmarks.list_bookmarks().to_vec(),
            history: self.history.list_history().to_vec(),
            settings: self.settings.get_settings().clone(),
        }
    }

    pub fn session(&self) -> SessionData {
        self.tabs.snapshot()
    }

    fn schedule_save(&self) {
        self.persistence.schedule_save(self.snapshot());
    }

    fn start_load(&self, ticket: LoadTicket) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&ticket.url).await;
            // The receiver only goes away with the browser itself.
            let _ = tx.send(Completion { ticket, result });
        });
    }

    fn start_optional(&self, ticket: Option<LoadTicket>) -> bool {
        match ticket {
            Some(ticket) => {
                self.start_load(ticket);
                true
            }
            None => false,
        }
    }

    // ─── Navigation ───

    /// Resolves address bar input against the active tab and starts the load.
    pub fn navigate(&mut self, input: &str) -> Result<(), BrowserError> {
        let tab_id = self.tabs.active_tab_id();
        self.navigate_tab(tab_id, input)
    }

    pub fn navigate_tab(&mut self, tab_id: u64, input: &str) -> Result<(), BrowserError> {
        let tab = self.tabs.get_tab(tab_id).ok_or(TabError::NotFound(tab_id))?;
        let tab_url = (tab.kind() == TabKind::Proxied).then(|| tab.url.clone());
        let engine = self.settings.get_settings().search_engine;

        let destination = url_resolver::resolve(input, engine, tab_url.as_deref())?;
        debug!(tab_id, url = %destination.url(), "Navigating");
        let ticket = self.tabs.navigate(tab_id, &destination)?;
        self.start_optional(ticket);
        self.schedule_save();
        Ok(())
    }

    /// Moves the active tab back. Returns false when there is nothing to go back to.
    pub fn back(&mut self) -> bool {
        let tab_id = self.tabs.active_tab_id();
        match self.tabs.go_back(tab_id) {
            Ok(ticket) => {
                self.start_optional(ticket);
                self.schedule_save();
                true
            }
            Err(e) => {
                debug!(tab_id, error = %e, "Back ignored");
                false
            }
        }
    }

    pub fn forward(&mut self) -> bool {
        let tab_id = self.tabs.active_tab_id();
        match self.tabs.go_forward(tab_id) {
            Ok(ticket) => {
                self.start_optional(ticket);
                self.schedule_save();
                true
            }
            Err(e) => {
                debug!(tab_id, error = %e, "Forward ignored");
                false
            }
        }
    }

    /// Re-fetches the active tab (or retries its failed load). Returns whether a
    /// fetch was started.
    pub fn reload(&mut self) -> bool {
        let tab_id = self.tabs.active_tab_id();
        self.reload_tab(tab_id)
    }

    pub fn reload_tab(&mut self, tab_id: u64) -> bool {
        match self.tabs.reload(tab_id) {
            Ok(ticket) => self.start_optional(ticket),
            Err(e) => {
                debug!(tab_id, error = %e, "Reload ignored");
                false
            }
        }
    }

    /// Starts a fetch for every restored proxied tab.
    pub fn reload_all(&mut self) -> usize {
        let ids: Vec<u64> = self.tabs.get_all_tabs().iter().map(|t| t.id).collect();
        ids.into_iter().filter(|id| self.reload_tab(*id)).count()
    }

    pub fn stop(&mut self) -> bool {
        let tab_id = self.tabs.active_tab_id();
        self.tabs.stop(tab_id).unwrap_or(false)
    }

    /// Waits for the next fetch to finish and applies it. Successful proxied
    /// loads are recorded in the history log.
    pub async fn next_completion(&mut self) -> Option<LoadEvent> {
        let Completion { ticket, result } = self.completions_rx.recv().await?;
        let outcome = self.tabs.complete_load(&ticket, result);

        match &outcome {
            LoadOutcome::Applied => {
                let title = self
                    .tabs
                    .get_tab(ticket.tab_id)
                    .map(|t| t.title.clone())
                    .unwrap_or_default();
                self.history.record_visit(&ticket.url, &title);
                self.schedule_save();
            }
            LoadOutcome::Failed(_) => self.schedule_save(),
            LoadOutcome::Stale => {}
        }

        Some(LoadEvent {
            tab_id: ticket.tab_id,
            url: ticket.url,
            outcome,
        })
    }

    // ─── Tabs ───

    pub fn new_tab(&mut self) -> Result<u64, BrowserError> {
        let id = self.tabs.new_tab()?;
        self.schedule_save();
        Ok(id)
    }

    pub fn close_tab(&mut self, tab_id: u64) -> Result<bool, BrowserError> {
        let closed = self.tabs.close_tab(tab_id)?;
        if closed {
            self.schedule_save();
        }
        Ok(closed)
    }

    pub fn close_others(&mut self, tab_id: u64) -> Result<usize, BrowserError> {
        let count = self.tabs.close_others(tab_id)?;
        self.schedule_save();
        Ok(count)
    }

    pub fn close_to_right(&mut self, tab_id: u64) -> Result<usize, BrowserError> {
        let count = self.tabs.close_to_right(tab_id)?;
        self.schedule_save();
        Ok(count)
    }

    pub fn close_all(&mut self) -> u64 {
        let id = self.tabs.close_all();
        self.schedule_save();
        id
    }

    /// Duplicates a tab; the copy renders itself with a fresh fetch.
    pub fn duplicate_tab(&mut self, tab_id: u64) -> Result<u64, BrowserError> {
        let id = self.tabs.duplicate_tab(tab_id)?;
        self.reload_tab(id);
        self.schedule_save();
        Ok(id)
    }

    pub fn toggle_pin(&mut self, tab_id: u64) -> Result<bool, BrowserError> {
        let pinned = self.tabs.toggle_pin(tab_id)?;
        self.schedule_save();
        Ok(pinned)
    }

    pub fn reopen_closed(&mut self) -> Result<Option<u64>, BrowserError> {
        let Some(id) = self.tabs.reopen_closed()? else {
            return Ok(None);
        };
        self.reload_tab(id);
        self.schedule_save();
        Ok(Some(id))
    }

    pub fn select_tab(&mut self, tab_id: u64) -> Result<(), BrowserError> {
        self.tabs.select_tab(tab_id)?;
        self.schedule_save();
        Ok(())
    }

    pub fn cycle_tab(&mut self, direction: CycleDirection) -> u64 {
        let id = self.tabs.cycle_tab(direction);
        self.schedule_save();
        id
    }

    // ─── Bookmarks, history, settings ───

    /// Toggles the active tab's url. `None` when the tab shows nothing.
    pub fn toggle_bookmark(&mut self) -> Option<bool> {
        let url = self.tabs.get_active_tab().url.clone();
        if url.is_empty() {
            return None;
        }
        Some(self.toggle_bookmark_url(&url))
    }

    pub fn toggle_bookmark_url(&mut self, url: &str) -> bool {
        let bookmarked = self.bookmarks.toggle_bookmark(url);
        self.schedule_save();
        bookmarked
    }

    pub fn delete_history_entry(&mut self, url: &str) -> bool {
        let removed = self.history.delete_entry(url);
        if removed {
            self.schedule_save();
        }
        removed
    }

    pub fn clear_history(&mut self) {
        self.history.clear_all();
        self.schedule_save();
    }

    pub fn set_setting(&mut self, key: &str, value: serde_json::Value) -> Result<(), BrowserError> {
        self.settings.set_value(key, value)?;
        self.schedule_save();
        Ok(())
    }

    pub fn zoom_in(&mut self) -> f64 {
        let zoom = self.settings.zoom_in();
        self.schedule_save();
        zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        let zoom = self.settings.zoom_out();
        self.schedule_save();
        zoom
    }

    /// Sets the identity remote mirrors are keyed by and pushes the current
    /// state under it.
    pub fn set_identity(&mut self, identity: Option<String>) {
        self.persistence.set_identity(identity);
        info!(signed_in = self.persistence.identity().is_some(), "Identity changed");
        self.schedule_save();
    }

    // ─── Keyboard ───

    /// Feeds a key-down to the dispatcher and runs whatever it fires.
    pub fn key_down(&mut self, key: &str) -> Option<Dispatched> {
        let command = self.shortcuts.key_down(key)?;
        let effect = self.execute(command);
        Some(Dispatched { command, effect })
    }

    pub fn key_up(&mut self, key: &str) {
        self.shortcuts.key_up(key);
    }

    /// Runs a session command. Returns the effect the UI has to apply, if any.
    pub fn execute(&mut self, command: ShortcutCommand) -> Option<UiEffect> {
        debug!(?command, "Executing command");
        match command {
            ShortcutCommand::NewTab => self.new_tab().err().and_then(Self::limit_dialog),
            ShortcutCommand::CloseTab => {
                let tab_id = self.tabs.active_tab_id();
                if let Err(e) = self.close_tab(tab_id) {
                    warn!(tab_id, error = %e, "Close failed");
                }
                None
            }
            ShortcutCommand::ReopenClosedTab => self.reopen_closed().err().and_then(Self::limit_dialog),
            ShortcutCommand::Reload => {
                self.reload();
                None
            }
            ShortcutCommand::Stop => {
                self.stop();
                None
            }
            ShortcutCommand::Back => {
                self.back();
                None
            }
            ShortcutCommand::Forward => {
                self.forward();
                None
            }
            ShortcutCommand::NextTab => {
                self.cycle_tab(CycleDirection::Next);
                None
            }
            ShortcutCommand::PreviousTab => {
                self.cycle_tab(CycleDirection::Previous);
                None
            }
            ShortcutCommand::FocusAddressBar => Some(UiEffect::FocusAddressBar),
            ShortcutCommand::ToggleDevOverlay => Some(UiEffect::ToggleDevOverlay),
            ShortcutCommand::ToggleFullscreen => Some(UiEffect::ToggleFullscreen),
        }
    }

    fn limit_dialog(err: BrowserError) -> Option<UiEffect> {
        err.is_tab_limit().then_some(UiEffect::ShowTabLimitDialog)
    }

    // ─── Lifecycle ───

    /// Writes the final state and stops the writer.
    pub async fn shutdown(self) {
        self.persistence.schedule_save(self.snapshot());
        self.persistence.shutdown().await;
        info!("Browser shut down");
    }
}
