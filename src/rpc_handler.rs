//! RPC method handler for the Hideout host bridge.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested without stdio.
//! `handle_method` dispatches one request to the [`Browser`]; fetch
//! completions are turned into events by [`load_event_json`].

use serde_json::{json, Value};

use crate::app::{Browser, LoadEvent};
use crate::managers::bookmark_manager::BookmarkManagerTrait;
use crate::managers::history_manager::HistoryManagerTrait;
use crate::managers::tab_manager::{CycleDirection, LoadOutcome, TabManagerTrait};
use crate::types::tab::{LoadState, Tab};

fn tab_id_param(params: &Value) -> Result<u64, String> {
    params
        .get("id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| "missing id".to_string())
}

/// JSON view of a tab as the UI renders it, derived fields included.
pub fn tab_json(tab: &Tab) -> Value {
    let (loading, error) = match &tab.load_state {
        LoadState::Idle => (false, Value::Null),
        LoadState::Loading { .. } => (true, Value::Null),
        LoadState::Failed { message, .. } => (false, json!(message)),
    };
    json!({
        "id": tab.id,
        "title": tab.title,
        "url": tab.url,
        "pinned": tab.pinned,
        "renderedContent": tab.rendered_content,
        "history": tab.navigation.entries(),
        "historyIndex": tab.navigation.history_index(),
        "canGoBack": tab.can_go_back(),
        "canGoForward": tab.can_go_forward(),
        "loading": loading,
        "error": error,
    })
}

/// Builds the event pushed to the UI for a finished fetch. Stale completions
/// produce nothing.
pub fn load_event_json(browser: &Browser, event: &LoadEvent) -> Option<Value> {
    match &event.outcome {
        LoadOutcome::Applied => {
            let title = browser
                .tabs()
                .get_tab(event.tab_id)
                .map(|t| t.title.clone())
                .unwrap_or_default();
            Some(json!({"event": "tab.loaded", "tabId": event.tab_id, "url": event.url, "title": title}))
        }
        LoadOutcome::Failed(err) => Some(json!({
            "event": "tab.failed",
            "tabId": event.tab_id,
            "url": event.url,
            "error": err.message(),
        })),
        LoadOutcome::Stale => None,
    }
}

/// Dispatch a JSON-RPC method call to the browser.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(browser: &mut Browser, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Session ───
        "session.get" => {
            let tabs = browser.tabs();
            let open: Vec<Value> = tabs.get_all_tabs().iter().map(tab_json).collect();
            let closed: Vec<Value> = tabs
                .closed_tabs()
                .iter()
                .map(|t| json!({"id": t.id, "title": t.title, "url": t.url}))
                .collect();
            Ok(json!({"tabs": open, "activeTabId": tabs.active_tab_id(), "closedStack": closed}))
        }

        // ─── Tabs ───
        "tab.new" => {
            let id = browser.new_tab().map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }
        "tab.close" => {
            let id = tab_id_param(params)?;
            let closed = browser.close_tab(id).map_err(|e| e.to_string())?;
            Ok(json!({"closed": closed}))
        }
        "tab.close_others" => {
            let id = tab_id_param(params)?;
            let count = browser.close_others(id).map_err(|e| e.to_string())?;
            Ok(json!({"closed": count}))
        }
        "tab.close_to_right" => {
            let id = tab_id_param(params)?;
            let count = browser.close_to_right(id).map_err(|e| e.to_string())?;
            Ok(json!({"closed": count}))
        }
        "tab.close_all" => Ok(json!({"id": browser.close_all()})),
        "tab.duplicate" => {
            let id = tab_id_param(params)?;
            let copy = browser.duplicate_tab(id).map_err(|e| e.to_string())?;
            Ok(json!({"id": copy}))
        }
        "tab.pin" => {
            let id = tab_id_param(params)?;
            let pinned = browser.toggle_pin(id).map_err(|e| e.to_string())?;
            Ok(json!({"pinned": pinned}))
        }
        "tab.select" => {
            let id = tab_id_param(params)?;
            browser.select_tab(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.cycle" => {
            let direction = match params.get("direction").and_then(|v| v.as_str()).unwrap_or("next") {
                "next" => CycleDirection::Next,
                "previous" | "prev" => CycleDirection::Previous,
                other => return Err(format!("invalid direction: {}", other)),
            };
            Ok(json!({"id": browser.cycle_tab(direction)}))
        }
        "tab.reopen" => {
            let id = browser.reopen_closed().map_err(|e| e.to_string())?;
            Ok(json!({"id": id}))
        }

        // ─── Navigation ───
        "nav.go" => {
            let input = params.get("input").and_then(|v| v.as_str()).ok_or("missing input")?;
            let navigated = match params.get("id").and_then(|v| v.as_u64()) {
                Some(id) => browser.navigate_tab(id, input),
                None => browser.navigate(input),
            };
            navigated.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "nav.back" => Ok(json!({"moved": browser.back()})),
        "nav.forward" => Ok(json!({"moved": browser.forward()})),
        "nav.reload" => Ok(json!({"loading": browser.reload()})),
        "nav.stop" => Ok(json!({"stopped": browser.stop()})),

        // ─── Bookmarks ───
        "bookmark.toggle" => {
            let bookmarked = match params.get("url").and_then(|v| v.as_str()) {
                Some(url) => {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        return Err("invalid url: must start with http:// or https://".to_string());
                    }
                    browser.toggle_bookmark_url(url)
                }
                None => browser.toggle_bookmark().ok_or("nothing to bookmark")?,
            };
            Ok(json!({"bookmarked": bookmarked}))
        }
        "bookmark.list" => Ok(json!(browser.bookmarks().list_bookmarks())),

        // ─── History ───
        "history.list" => Ok(json!(browser.history().list_history())),
        "history.search" => {
            let query = params.get("query").and_then(|v| v.as_str()).ok_or("missing query")?;
            Ok(json!(browser.history().search_history(query)))
        }
        "history.delete" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            Ok(json!({"deleted": browser.delete_history_entry(url)}))
        }
        "history.clear" => {
            browser.clear_history();
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => serde_json::to_value(browser.settings()).map_err(|e| e.to_string()),
        "settings.set" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            browser.set_setting(key, value).map_err(|e| e.to_string())?;
            serde_json::to_value(browser.settings()).map_err(|e| e.to_string())
        }
        "settings.zoom_in" => Ok(json!({"zoom": browser.zoom_in()})),
        "settings.zoom_out" => Ok(json!({"zoom": browser.zoom_out()})),

        // ─── Identity ───
        "identity.set" => {
            let identity = params
                .get("identity")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            browser.set_identity(identity);
            Ok(json!({"syncing": browser.identity().is_some()}))
        }

        // ─── Keyboard ───
        "key.down" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            serde_json::to_value(browser.key_down(key)).map_err(|e| e.to_string())
        }
        "key.up" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            browser.key_up(key);
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
