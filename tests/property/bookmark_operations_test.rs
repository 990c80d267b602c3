//! Property-based tests for Bookmark Manager operations.
//!
//! Bookmarks are a set of urls in insertion order, capped at
//! `MAX_BOOKMARKS` with the oldest evicted first.

use hideout::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait, MAX_BOOKMARKS};
use proptest::prelude::*;

fn arb_url() -> impl Strategy<Value = String> {
    (0..150u16).prop_map(|n| format!("https://site{n}.example/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Below the cap, toggling twice leaves the set exactly as it was.
    #[test]
    fn double_toggle_is_identity(
        seed in prop::collection::vec(arb_url(), 0..40),
        url in arb_url(),
    ) {
        let mut mgr = BookmarkManager::new();
        for u in &seed {
            mgr.add_bookmark(u);
        }
        let before = mgr.list_bookmarks().to_vec();

        let first = mgr.toggle_bookmark(&url);
        prop_assert_eq!(first, !before.contains(&url));
        prop_assert_eq!(mgr.is_bookmarked(&url), first);
        mgr.toggle_bookmark(&url);

        if first {
            prop_assert_eq!(mgr.list_bookmarks(), before.as_slice());
        } else {
            prop_assert!(mgr.is_bookmarked(&url));
            prop_assert_eq!(mgr.bookmark_count(), before.len());
        }
    }

    /// At the cap, adding a new url evicts the oldest, so toggling it off
    /// again leaves one fewer bookmark and the evicted url stays gone.
    #[test]
    fn double_toggle_at_cap_loses_oldest(offset in 0..50u16) {
        let mut mgr = BookmarkManager::new();
        for i in 0..MAX_BOOKMARKS {
            mgr.add_bookmark(&format!("https://kept{i}.example/"));
        }
        let before = mgr.list_bookmarks().to_vec();
        let url = format!("https://fresh{offset}.example/");

        prop_assert!(mgr.toggle_bookmark(&url));
        prop_assert!(!mgr.toggle_bookmark(&url));

        prop_assert_eq!(mgr.bookmark_count(), MAX_BOOKMARKS - 1);
        prop_assert!(!mgr.is_bookmarked(&before[0]));
        prop_assert_eq!(mgr.list_bookmarks(), &before[1..]);
    }

    /// Any sequence of toggles keeps urls unique and within the cap, and the
    /// newest addition is always kept.
    #[test]
    fn toggles_respect_cap_and_uniqueness(urls in prop::collection::vec(arb_url(), 0..300)) {
        let mut mgr = BookmarkManager::new();
        for url in &urls {
            let added = mgr.toggle_bookmark(url);
            if added {
                prop_assert_eq!(mgr.list_bookmarks().last(), Some(url));
            }

            let list = mgr.list_bookmarks();
            prop_assert!(list.len() <= MAX_BOOKMARKS);
            let unique: std::collections::HashSet<&String> = list.iter().collect();
            prop_assert_eq!(unique.len(), list.len());
        }
    }

    /// Restoring from storage drops duplicates and keeps at most the newest
    /// `MAX_BOOKMARKS`.
    #[test]
    fn restore_normalizes(urls in prop::collection::vec(arb_url(), 0..250)) {
        let mgr = BookmarkManager::restore(urls.clone());
        let list = mgr.list_bookmarks();
        prop_assert!(list.len() <= MAX_BOOKMARKS);
        let unique: std::collections::HashSet<&String> = list.iter().collect();
        prop_assert_eq!(unique.len(), list.len());
        for url in list {
            prop_assert!(urls.contains(url));
        }
    }
}
