//! SQL DDL for all journal tables.
//!
//! Defines the `entries`, `insights`, and `schema_meta` tables. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Accomplishment entries, one row per entry, scoped by owner
CREATE TABLE IF NOT EXISTS entries (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    text TEXT NOT NULL CHECK(length(text) > 0),
    rating INTEGER NOT NULL CHECK(rating >= 1 AND rating <= 10),
    timestamp TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_owner ON entries(owner_id);

-- Cached insights, upserted by composite id "{timeframe_type}_{timeframe_key}"
CREATE TABLE IF NOT EXISTS insights (
    owner_id TEXT NOT NULL,
    id TEXT NOT NULL,
    timeframe_type TEXT NOT NULL CHECK(timeframe_type IN ('month','year')),
    timeframe_key TEXT NOT NULL,
    content TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    accomplishment_count INTEGER NOT NULL,
    accomplishment_ids TEXT NOT NULL,
    PRIMARY KEY (owner_id, id)
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"entries".to_string()));
        assert!(tables.contains(&"insights".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn rating_check_rejects_out_of_range() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO entries (id, owner_id, text, rating, timestamp, created_at) \
             VALUES ('x', 'me', 'text', 11, 'ts', 'ts')",
            [],
        );
        assert!(result.is_err());
    }
}
