use accomplish::db;
use accomplish::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use accomplish::journal::store::{JournalStore, SqliteStore};
use accomplish::journal::types::NewEntry;
use tempfile::TempDir;

#[test]
fn open_creates_file_and_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("journal.db");

    let conn = db::open_database(&path).unwrap();
    assert!(path.exists());

    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");

    let timeout: i64 = conn
        .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);

    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn reopening_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("journal.db");

    drop(db::open_database(&path).unwrap());
    let conn = db::open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn rating_outside_range_is_rejected_by_schema() {
    let conn = db::open_memory_database().unwrap();
    let result = conn.execute(
        "INSERT INTO entries (id, owner_id, text, rating, timestamp, created_at) \
         VALUES ('x', 'me', 'too much', 11, '2026-01-01T00:00:00+00:00', '2026-01-01T00:00:00+00:00')",
        [],
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn entries_survive_reopen_and_health_counts_them() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("journal.db");

    let store = SqliteStore::new(db::open_database(&path).unwrap());
    store
        .add_entry("me", NewEntry::new("wrote tests", 7, None).unwrap())
        .await
        .unwrap();
    store
        .add_entry("you", NewEntry::new("reviewed them", 6, None).unwrap())
        .await
        .unwrap();
    drop(store);

    let conn = db::open_database(&path).unwrap();
    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.entry_count, 2);
    assert_eq!(report.insight_count, 0);
    assert_eq!(report.owner_count, 2);

    let store = SqliteStore::new(conn);
    let entries = store.list_entries("me").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "wrote tests");
}
