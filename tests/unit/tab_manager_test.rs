use hideout::managers::tab_manager::{
    CycleDirection, LoadKind, LoadOutcome, LoadTicket, TabManager, TabManagerTrait, MAX_CLOSED_TABS,
    MAX_TABS,
};
use hideout::types::errors::{NavigationError, ProxyError, TabError};
use hideout::types::navigation::NavigationHistory;
use hideout::types::page::{Destination, InternalPage, SanitizedPage};
use hideout::types::session::SessionData;
use hideout::types::tab::{LoadState, Tab, TabKind, NEW_TAB_TITLE};

fn page(title: &str) -> SanitizedPage {
    SanitizedPage {
        html: format!("<html><title>{}</title></html>", title),
        title: Some(title.to_string()),
    }
}

fn direct(url: &str) -> Destination {
    Destination::Direct(url.to_string())
}

/// Navigates and completes the load successfully.
fn visit(mgr: &mut TabManager, tab_id: u64, url: &str) {
    let ticket = mgr.navigate(tab_id, &direct(url)).unwrap().unwrap();
    assert_eq!(mgr.complete_load(&ticket, Ok(page(url))), LoadOutcome::Applied);
}

fn full_session() -> TabManager {
    let mut mgr = TabManager::new();
    for _ in 1..MAX_TABS {
        mgr.new_tab().unwrap();
    }
    mgr
}

// ─── Lifecycle ───

#[test]
fn test_new_session_has_one_empty_tab() {
    let mgr = TabManager::new();
    assert_eq!(mgr.tab_count(), 1);
    let tab = mgr.get_active_tab();
    assert_eq!(tab.title, NEW_TAB_TITLE);
    assert_eq!(tab.kind(), TabKind::Empty);
    assert_eq!(tab.navigation.history_index(), -1);
}

#[test]
fn test_new_tab_appends_and_activates() {
    let mut mgr = TabManager::new();
    let first = mgr.active_tab_id();
    let id = mgr.new_tab().unwrap();
    assert_ne!(id, first);
    assert_eq!(mgr.active_tab_id(), id);
    assert_eq!(mgr.get_all_tabs().last().unwrap().id, id);
}

#[test]
fn test_sixth_tab_hits_limit() {
    let mut mgr = full_session();
    assert_eq!(mgr.tab_count(), 5);
    let active = mgr.active_tab_id();

    assert_eq!(mgr.new_tab(), Err(TabError::TabLimitReached { limit: 5 }));
    assert_eq!(mgr.tab_count(), 5);
    assert_eq!(mgr.active_tab_id(), active);
}

#[test]
fn test_ids_are_never_reused() {
    let mut mgr = TabManager::new();
    let a = mgr.new_tab().unwrap();
    mgr.close_tab(a).unwrap();
    let b = mgr.new_tab().unwrap();
    assert!(b > a);
}

#[test]
fn test_close_last_tab_is_noop() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    assert_eq!(mgr.close_tab(id), Ok(false));
    assert_eq!(mgr.tab_count(), 1);
    assert_eq!(mgr.active_tab_id(), id);
    assert!(mgr.closed_tabs().is_empty());
}

#[test]
fn test_close_unknown_tab() {
    let mut mgr = TabManager::new();
    assert_eq!(mgr.close_tab(999), Err(TabError::NotFound(999)));
}

#[test]
fn test_close_active_selects_same_index() {
    let mut mgr = TabManager::new();
    let t2 = mgr.new_tab().unwrap();
    let t3 = mgr.new_tab().unwrap();
    mgr.select_tab(t2).unwrap();

    assert_eq!(mgr.close_tab(t2), Ok(true));
    assert_eq!(mgr.active_tab_id(), t3);
    assert_eq!(mgr.closed_tabs()[0].id, t2);
}

#[test]
fn test_close_active_last_position_selects_previous() {
    let mut mgr = TabManager::new();
    let t1 = mgr.active_tab_id();
    let t2 = mgr.new_tab().unwrap();
    assert_eq!(mgr.close_tab(t2), Ok(true));
    assert_eq!(mgr.active_tab_id(), t1);
}

#[test]
fn test_close_inactive_keeps_active() {
    let mut mgr = TabManager::new();
    let t1 = mgr.active_tab_id();
    let t2 = mgr.new_tab().unwrap();
    mgr.close_tab(t1).unwrap();
    assert_eq!(mgr.active_tab_id(), t2);
}

#[test]
fn test_closed_stack_is_bounded_and_most_recent_first() {
    let mut mgr = TabManager::new();
    let mut closed_ids = Vec::new();
    for _ in 0..(MAX_CLOSED_TABS + 3) {
        let id = mgr.new_tab().unwrap();
        mgr.close_tab(id).unwrap();
        closed_ids.push(id);
    }
    let closed = mgr.closed_tabs();
    assert_eq!(closed.len(), MAX_CLOSED_TABS);
    assert_eq!(closed[0].id, *closed_ids.last().unwrap());
    assert!(!closed.iter().any(|t| t.id == closed_ids[0]));
}

#[test]
fn test_closed_tab_drops_rendered_content() {
    let mut mgr = TabManager::new();
    let id = mgr.new_tab().unwrap();
    visit(&mut mgr, id, "https://a.com");
    assert!(mgr.get_tab(id).unwrap().rendered_content.is_some());
    mgr.close_tab(id).unwrap();
    assert_eq!(mgr.closed_tabs()[0].rendered_content, None);
}

#[test]
fn test_close_others() {
    let mut mgr = full_session();
    let keep = mgr.get_all_tabs()[2].id;
    assert_eq!(mgr.close_others(keep), Ok(4));
    assert_eq!(mgr.tab_count(), 1);
    assert_eq!(mgr.active_tab_id(), keep);
    assert_eq!(mgr.closed_tabs().len(), 4);
}

#[test]
fn test_close_to_right() {
    let mut mgr = full_session();
    let ids: Vec<u64> = mgr.get_all_tabs().iter().map(|t| t.id).collect();
    // Active is the last tab, which gets removed.
    assert_eq!(mgr.close_to_right(ids[1]), Ok(3));
    assert_eq!(mgr.tab_count(), 2);
    assert_eq!(mgr.active_tab_id(), ids[1]);

    assert_eq!(mgr.close_to_right(ids[1]), Ok(0));
    assert_eq!(mgr.tab_count(), 2);
}

#[test]
fn test_close_all_replaces_with_fresh_tab() {
    let mut mgr = full_session();
    let old: Vec<u64> = mgr.get_all_tabs().iter().map(|t| t.id).collect();
    let id = mgr.close_all();
    assert_eq!(mgr.tab_count(), 1);
    assert_eq!(mgr.active_tab_id(), id);
    assert!(!old.contains(&id));
    assert_eq!(mgr.get_active_tab().kind(), TabKind::Empty);
    assert_eq!(mgr.closed_tabs().len(), 5);
}

#[test]
fn test_toggle_pin() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    assert_eq!(mgr.toggle_pin(id), Ok(true));
    assert_eq!(mgr.toggle_pin(id), Ok(false));
    assert_eq!(mgr.toggle_pin(42), Err(TabError::NotFound(42)));
}

#[test]
fn test_duplicate_copies_history_not_content() {
    let mut mgr = TabManager::new();
    let t1 = mgr.active_tab_id();
    let t2 = mgr.new_tab().unwrap();
    visit(&mut mgr, t1, "https://a.com");
    visit(&mut mgr, t1, "https://b.com");
    mgr.toggle_pin(t1).unwrap();

    let copy = mgr.duplicate_tab(t1).unwrap();
    let ids: Vec<u64> = mgr.get_all_tabs().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![t1, copy, t2]);
    assert_eq!(mgr.active_tab_id(), copy);

    let source = mgr.get_tab(t1).unwrap().clone();
    let dup = mgr.get_tab(copy).unwrap();
    assert_eq!(dup.url, source.url);
    assert_eq!(dup.navigation, source.navigation);
    assert!(dup.pinned);
    assert_eq!(dup.rendered_content, None);
}

#[test]
fn test_duplicate_respects_limit() {
    let mut mgr = full_session();
    let id = mgr.active_tab_id();
    assert_eq!(mgr.duplicate_tab(id), Err(TabError::TabLimitReached { limit: 5 }));
}

#[test]
fn test_reopen_closed_restores_history_with_fresh_id() {
    let mut mgr = TabManager::new();
    let id = mgr.new_tab().unwrap();
    visit(&mut mgr, id, "https://a.com");
    visit(&mut mgr, id, "https://b.com");
    mgr.toggle_pin(id).unwrap();
    mgr.close_tab(id).unwrap();

    let reopened = mgr.reopen_closed().unwrap().unwrap();
    assert_ne!(reopened, id);
    assert_eq!(mgr.active_tab_id(), reopened);
    let tab = mgr.get_tab(reopened).unwrap();
    assert_eq!(tab.url, "https://b.com");
    assert_eq!(tab.navigation.entries(), ["https://a.com", "https://b.com"]);
    assert!(tab.pinned);
    assert!(mgr.closed_tabs().is_empty());
}

#[test]
fn test_reopen_with_empty_stack_is_noop() {
    let mut mgr = TabManager::new();
    assert_eq!(mgr.reopen_closed(), Ok(None));
    assert_eq!(mgr.tab_count(), 1);
}

#[test]
fn test_reopen_at_limit_keeps_stack() {
    let mut mgr = full_session();
    let id = mgr.active_tab_id();
    mgr.close_tab(id).unwrap();
    mgr.new_tab().unwrap();
    assert_eq!(mgr.reopen_closed(), Err(TabError::TabLimitReached { limit: 5 }));
    assert_eq!(mgr.closed_tabs().len(), 1);
}

#[test]
fn test_cycle_wraps_both_ways() {
    let mut mgr = TabManager::new();
    let t1 = mgr.active_tab_id();
    let t2 = mgr.new_tab().unwrap();
    let t3 = mgr.new_tab().unwrap();

    assert_eq!(mgr.cycle_tab(CycleDirection::Next), t1);
    assert_eq!(mgr.cycle_tab(CycleDirection::Previous), t3);
    assert_eq!(mgr.cycle_tab(CycleDirection::Previous), t2);
}

#[test]
fn test_select_unknown_tab() {
    let mut mgr = TabManager::new();
    assert_eq!(mgr.select_tab(77), Err(TabError::NotFound(77)));
}

// ─── Navigation and loads ───

#[test]
fn test_navigate_commits_on_success() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    let ticket = mgr.navigate(id, &direct("https://example.com")).unwrap().unwrap();
    assert_eq!(ticket.kind, LoadKind::Push);
    assert!(mgr.get_tab(id).unwrap().is_loading());
    assert_eq!(mgr.get_tab(id).unwrap().url, "", "url changes only on success");

    assert_eq!(mgr.complete_load(&ticket, Ok(page("Example Domain"))), LoadOutcome::Applied);
    let tab = mgr.get_tab(id).unwrap();
    assert_eq!(tab.url, "https://example.com");
    assert_eq!(tab.title, "Example Domain");
    assert_eq!(tab.navigation.entries(), ["https://example.com"]);
    assert_eq!(tab.load_state, LoadState::Idle);
    assert!(tab.rendered_content.as_deref().unwrap().contains("Example Domain"));
}

#[test]
fn test_missing_title_falls_back_to_host() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    let ticket = mgr.navigate(id, &direct("https://example.com/path")).unwrap().unwrap();
    let untitled = SanitizedPage {
        html: "<p>hi</p>".to_string(),
        title: None,
    };
    mgr.complete_load(&ticket, Ok(untitled));
    assert_eq!(mgr.get_tab(id).unwrap().title, "example.com");
}

#[test]
fn test_stale_response_is_dropped() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    let first = mgr.navigate(id, &direct("https://a.com")).unwrap().unwrap();
    let second = mgr.navigate(id, &direct("https://b.com")).unwrap().unwrap();
    let third = mgr.navigate(id, &direct("https://c.com")).unwrap().unwrap();

    assert_eq!(mgr.complete_load(&first, Ok(page("A"))), LoadOutcome::Stale);
    assert_eq!(mgr.complete_load(&second, Ok(page("B"))), LoadOutcome::Stale);
    assert_eq!(mgr.get_tab(id).unwrap().url, "");

    assert_eq!(mgr.complete_load(&third, Ok(page("C"))), LoadOutcome::Applied);
    let tab = mgr.get_tab(id).unwrap();
    assert_eq!(tab.url, "https://c.com");
    assert_eq!(tab.navigation.entries(), ["https://c.com"]);
}

#[test]
fn test_completion_for_closed_tab_is_stale() {
    let mut mgr = TabManager::new();
    let id = mgr.new_tab().unwrap();
    let ticket = mgr.navigate(id, &direct("https://a.com")).unwrap().unwrap();
    mgr.close_tab(id).unwrap();
    assert_eq!(mgr.complete_load(&ticket, Ok(page("A"))), LoadOutcome::Stale);
}

#[test]
fn test_stop_abandons_in_flight_load() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    let ticket = mgr.navigate(id, &direct("https://a.com")).unwrap().unwrap();
    assert_eq!(mgr.stop(id), Ok(true));
    assert!(!mgr.get_tab(id).unwrap().is_loading());
    assert_eq!(mgr.complete_load(&ticket, Ok(page("A"))), LoadOutcome::Stale);
    assert_eq!(mgr.stop(id), Ok(false));
}

#[test]
fn test_failed_load_keeps_history_and_reload_retries() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    visit(&mut mgr, id, "https://a.com");

    let ticket = mgr.navigate(id, &direct("https://down.test")).unwrap().unwrap();
    let err = ProxyError::Status(502);
    assert_eq!(mgr.complete_load(&ticket, Err(err.clone())), LoadOutcome::Failed(err));

    let tab = mgr.get_tab(id).unwrap();
    assert_eq!(tab.url, "https://a.com");
    assert_eq!(tab.navigation.entries(), ["https://a.com"]);
    assert!(matches!(&tab.load_state, LoadState::Failed { url, .. } if url == "https://down.test"));

    let retry = mgr.reload(id).unwrap().unwrap();
    assert_eq!(retry.url, "https://down.test");
    assert_eq!(retry.kind, LoadKind::Push);
}

#[test]
fn test_reload_refetches_current_page() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    visit(&mut mgr, id, "https://a.com");
    let ticket = mgr.reload(id).unwrap().unwrap();
    assert_eq!(ticket.url, "https://a.com");
    assert_eq!(ticket.kind, LoadKind::Revisit);
    assert_eq!(mgr.complete_load(&ticket, Ok(page("A again"))), LoadOutcome::Applied);
    assert_eq!(mgr.get_tab(id).unwrap().navigation.len(), 1);
}

#[test]
fn test_reload_empty_tab_does_nothing() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    assert_eq!(mgr.reload(id), Ok(None));
}

#[test]
fn test_internal_page_shown_without_fetch() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    let ticket = mgr
        .navigate(id, &Destination::Internal(InternalPage::Settings))
        .unwrap();
    assert_eq!(ticket, None);
    let tab = mgr.get_tab(id).unwrap();
    assert_eq!(tab.url, "hideout://settings");
    assert_eq!(tab.title, "Settings");
    assert_eq!(tab.kind(), TabKind::Internal(InternalPage::Settings));
    assert_eq!(tab.navigation.history_index(), 0);
}

#[test]
fn test_internal_page_supersedes_pending_fetch() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    let ticket = mgr.navigate(id, &direct("https://a.com")).unwrap().unwrap();
    mgr.navigate(id, &Destination::Internal(InternalPage::Help)).unwrap();
    assert_eq!(mgr.complete_load(&ticket, Ok(page("A"))), LoadOutcome::Stale);
    assert_eq!(mgr.get_tab(id).unwrap().url, "hideout://help");
}

#[test]
fn test_back_forward_issue_revisit_loads() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    visit(&mut mgr, id, "https://a.com");
    visit(&mut mgr, id, "https://b.com");

    let ticket = mgr.go_back(id).unwrap().unwrap();
    assert_eq!(ticket.url, "https://a.com");
    assert_eq!(ticket.kind, LoadKind::Revisit);
    assert_eq!(mgr.get_tab(id).unwrap().url, "https://a.com");
    assert!(mgr.get_tab(id).unwrap().can_go_forward());

    assert_eq!(mgr.go_back(id), Err(NavigationError::NoHistory));

    let ticket = mgr.go_forward(id).unwrap().unwrap();
    assert_eq!(ticket.url, "https://b.com");
    assert_eq!(mgr.go_forward(id), Err(NavigationError::NoHistory));
}

#[test]
fn test_back_to_internal_page_needs_no_fetch() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    mgr.navigate(id, &Destination::Internal(InternalPage::History)).unwrap();
    visit(&mut mgr, id, "https://a.com");
    assert_eq!(mgr.go_back(id), Ok(None));
    assert_eq!(mgr.get_tab(id).unwrap().title, "History");
}

#[test]
fn test_navigate_from_back_state_truncates() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    visit(&mut mgr, id, "https://a.com");
    visit(&mut mgr, id, "https://b.com");
    visit(&mut mgr, id, "https://c.com");
    let back = mgr.go_back(id).unwrap().unwrap();
    mgr.complete_load(&back, Ok(page("B")));

    visit(&mut mgr, id, "https://d.com");
    let tab = mgr.get_tab(id).unwrap();
    assert_eq!(tab.navigation.entries(), ["https://a.com", "https://b.com", "https://d.com"]);
    assert_eq!(tab.navigation.history_index(), 2);
}

#[test]
fn test_revisit_completion_after_back_is_stale() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    visit(&mut mgr, id, "https://a.com");
    let reload = mgr.reload(id).unwrap().unwrap();
    // Forged ticket for an url the tab no longer shows.
    let forged = LoadTicket {
        url: "https://elsewhere.test".to_string(),
        ..reload.clone()
    };
    assert_eq!(mgr.complete_load(&forged, Ok(page("X"))), LoadOutcome::Stale);
    assert_eq!(mgr.complete_load(&reload, Ok(page("A"))), LoadOutcome::Applied);
}

#[test]
fn test_update_tab_title() {
    let mut mgr = TabManager::new();
    let id = mgr.active_tab_id();
    mgr.update_tab_title(id, "Renamed").unwrap();
    assert_eq!(mgr.get_tab(id).unwrap().title, "Renamed");
    assert_eq!(mgr.update_tab_title(99, "x"), Err(TabError::NotFound(99)));
}

// ─── Restore ───

fn stored_tab(id: u64, urls: &[&str], index: i64) -> Tab {
    let mut tab = Tab::empty(id);
    tab.navigation = NavigationHistory::from_parts(urls.iter().map(|u| u.to_string()).collect(), index);
    tab.url = "stale".to_string();
    tab
}

#[test]
fn test_restore_enforces_invariants() {
    let tabs: Vec<Tab> = (1..=7).map(|id| stored_tab(id, &["https://a.com"], 0)).collect();
    let data = SessionData {
        tabs,
        active_tab_id: 99,
        closed_stack: vec![stored_tab(20, &[], -1)],
    };
    let mut mgr = TabManager::restore(data);

    assert_eq!(mgr.tab_count(), MAX_TABS);
    assert_eq!(mgr.active_tab_id(), 1);
    assert!(mgr.get_all_tabs().iter().all(|t| t.url == "https://a.com"));

    mgr.close_tab(1).unwrap();
    let id = mgr.new_tab().unwrap();
    assert!(id > 20, "new ids continue after the largest stored id");
}

#[test]
fn test_restore_empty_session_creates_tab() {
    let data = SessionData {
        tabs: Vec::new(),
        active_tab_id: 3,
        closed_stack: Vec::new(),
    };
    let mgr = TabManager::restore(data);
    assert_eq!(mgr.tab_count(), 1);
    assert_eq!(mgr.active_tab_id(), mgr.get_all_tabs()[0].id);
}

#[test]
fn test_restore_drops_duplicate_ids() {
    let data = SessionData {
        tabs: vec![stored_tab(4, &[], -1), stored_tab(4, &[], -1), stored_tab(5, &[], -1)],
        active_tab_id: 5,
        closed_stack: Vec::new(),
    };
    let mgr = TabManager::restore(data);
    let ids: Vec<u64> = mgr.get_all_tabs().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![4, 5]);
    assert_eq!(mgr.active_tab_id(), 5);
}

#[test]
fn test_restore_renumbers_exhausted_ids() {
    let data = SessionData {
        tabs: vec![
            stored_tab(u64::MAX - 1, &["https://a.com"], 0),
            stored_tab(u64::MAX, &["https://b.com"], 0),
        ],
        active_tab_id: u64::MAX,
        closed_stack: vec![stored_tab(u64::MAX - 2, &["https://c.com"], 0)],
    };
    let mut mgr = TabManager::restore(data);

    let ids: Vec<u64> = mgr.get_all_tabs().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(mgr.get_active_tab().url, "https://b.com");
    assert_eq!(mgr.closed_tabs()[0].id, 3);

    assert_eq!(mgr.new_tab().unwrap(), 4);
    assert_eq!(mgr.reopen_closed().unwrap(), Some(5));
}

#[test]
fn test_restore_keeps_large_ids_with_room_left() {
    let data = SessionData {
        tabs: vec![stored_tab(1_000_000, &[], -1)],
        active_tab_id: 1_000_000,
        closed_stack: Vec::new(),
    };
    let mut mgr = TabManager::restore(data);
    assert_eq!(mgr.active_tab_id(), 1_000_000);
    assert_eq!(mgr.new_tab().unwrap(), 1_000_001);
}
