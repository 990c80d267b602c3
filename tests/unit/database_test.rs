//! Unit tests for the Hideout database layer (connection + migrations + kv store).

use hideout::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use hideout::database::Database;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_kv_store() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let exists: bool = db
        .connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='kv_store'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);
    assert!(exists, "kv_store should exist after migrations");
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hideout.db");
    {
        let mut db = Database::open(&path).unwrap();
        db.put_values(&[("hideout.bookmarks", "[\"https://a.com\"]".to_string())])
            .unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
    let rows: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(
        db.get_value("hideout.bookmarks").unwrap().as_deref(),
        Some("[\"https://a.com\"]")
    );
}

#[test]
fn test_open_creates_missing_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("hideout.db");
    assert!(Database::open(&path).is_ok());
    assert!(path.exists());
}

#[test]
fn test_open_under_a_file_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let result = Database::open(blocker.join("nested").join("hideout.db"));
    assert!(result.is_err());
}

#[test]
fn test_get_missing_value_is_none() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.get_value("hideout.tabs").unwrap(), None);
}

#[test]
fn test_put_values_upserts() {
    let mut db = Database::open_in_memory().unwrap();
    db.put_values(&[
        ("hideout.settings", "{\"zoom\":1.0}".to_string()),
        ("hideout.history", "[]".to_string()),
    ])
    .unwrap();
    db.put_values(&[("hideout.settings", "{\"zoom\":1.5}".to_string())])
        .unwrap();

    assert_eq!(
        db.get_value("hideout.settings").unwrap().as_deref(),
        Some("{\"zoom\":1.5}")
    );
    assert_eq!(db.get_value("hideout.history").unwrap().as_deref(), Some("[]"));
}

#[test]
fn test_delete_value() {
    let mut db = Database::open_in_memory().unwrap();
    db.put_values(&[("hideout.tabs", "{}".to_string())]).unwrap();
    assert!(db.delete_value("hideout.tabs").unwrap());
    assert!(!db.delete_value("hideout.tabs").unwrap());
    assert_eq!(db.get_value("hideout.tabs").unwrap(), None);
}
