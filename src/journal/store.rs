//! Storage collaborator: owner-scoped entry listing and insight persistence.
//!
//! [`JournalStore`] is the seam the core depends on. [`SqliteStore`] is the
//! production implementation; every call runs on `spawn_blocking` behind a
//! shared connection.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::{BucketKey, Entry, Granularity, Insight, NewEntry};
use crate::error::{JournalError, Result};

/// Owner-scoped persistence for entries and insights.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Every entry the owner has logged, newest first.
    async fn list_entries(&self, owner: &str) -> Result<Vec<Entry>>;

    /// Persist a validated entry and return it with its assigned id.
    async fn add_entry(&self, owner: &str, entry: NewEntry) -> Result<Entry>;

    /// Cached insight for an exact `(type, key)` pair. `Ok(None)` on a miss.
    async fn get_insight(
        &self,
        owner: &str,
        timeframe_type: Granularity,
        timeframe_key: &BucketKey,
    ) -> Result<Option<Insight>>;

    /// Upsert an insight at its composite id. Either the whole record lands
    /// or nothing does.
    async fn put_insight(&self, owner: &str, insight: &Insight) -> Result<Insight>;
}

/// SQLite-backed [`JournalStore`].
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Every insight the owner has cached, ordered by composite id.
    pub async fn list_insights(&self, owner: &str) -> Result<Vec<Insight>> {
        let owner = require_owner(owner)?;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timeframe_type, timeframe_key, content, generated_at, \
                 accomplishment_count, accomplishment_ids \
                 FROM insights WHERE owner_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map(params![owner], read_insight_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(InsightRow::into_insight).collect()
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| JournalError::Storage(format!("db lock poisoned: {e}")))?;
            f(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl JournalStore for SqliteStore {
    async fn list_entries(&self, owner: &str) -> Result<Vec<Entry>> {
        let owner = require_owner(owner)?;
        let mut entries = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, text, rating, timestamp FROM entries \
                     WHERE owner_id = ?1 ORDER BY rowid DESC",
                )?;
                let rows: Vec<(String, String, i64, String)> = stmt
                    .query_map(params![owner], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                rows.into_iter()
                    .map(|(id, text, rating, timestamp)| {
                        Ok(Entry {
                            id,
                            text,
                            rating: u8::try_from(rating).map_err(|_| {
                                JournalError::Storage(format!("corrupt rating: {rating}"))
                            })?,
                            timestamp: parse_timestamp(&timestamp)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .await?;

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        tracing::debug!(count = entries.len(), "entries listed");
        Ok(entries)
    }

    async fn add_entry(&self, owner: &str, entry: NewEntry) -> Result<Entry> {
        let owner = require_owner(owner)?;
        let id = uuid::Uuid::now_v7().to_string();
        let entry = entry.into_entry(id);
        let row = entry.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO entries (id, owner_id, text, rating, timestamp, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    owner,
                    row.text,
                    i64::from(row.rating),
                    row.timestamp.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await?;

        tracing::info!(id = %entry.id, rating = entry.rating, "entry saved");
        Ok(entry)
    }

    async fn get_insight(
        &self,
        owner: &str,
        timeframe_type: Granularity,
        timeframe_key: &BucketKey,
    ) -> Result<Option<Insight>> {
        let owner = require_owner(owner)?;
        let key = timeframe_key.to_string();

        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, timeframe_type, timeframe_key, content, generated_at, \
                     accomplishment_count, accomplishment_ids \
                     FROM insights \
                     WHERE owner_id = ?1 AND timeframe_type = ?2 AND timeframe_key = ?3 \
                     LIMIT 1",
                    params![owner, timeframe_type.as_str(), key],
                    read_insight_row,
                )
                .optional()?;
            row.map(InsightRow::into_insight).transpose()
        })
        .await
    }

    async fn put_insight(&self, owner: &str, insight: &Insight) -> Result<Insight> {
        let owner = require_owner(owner)?;
        let record = insight.clone();

        self.with_conn(move |conn| {
            let ids_json = serde_json::to_string(&record.accomplishment_ids)?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO insights (owner_id, id, timeframe_type, timeframe_key, content, \
                 generated_at, accomplishment_count, accomplishment_ids) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(owner_id, id) DO UPDATE SET \
                 timeframe_type = excluded.timeframe_type, \
                 timeframe_key = excluded.timeframe_key, \
                 content = excluded.content, \
                 generated_at = excluded.generated_at, \
                 accomplishment_count = excluded.accomplishment_count, \
                 accomplishment_ids = excluded.accomplishment_ids",
                params![
                    owner,
                    record.id,
                    record.timeframe_type.as_str(),
                    record.timeframe_key.as_str(),
                    record.content,
                    record.generated_at.to_rfc3339(),
                    record.accomplishment_count as i64,
                    ids_json,
                ],
            )?;
            tx.commit()?;
            Ok(record)
        })
        .await
    }
}

/// An empty owner id means nobody is signed in.
fn require_owner(owner: &str) -> Result<String> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(JournalError::NotConfigured("no owner identity".into()));
    }
    Ok(owner.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| JournalError::Storage(format!("corrupt timestamp {raw:?}: {e}")))
}

struct InsightRow {
    id: String,
    timeframe_type: String,
    timeframe_key: String,
    content: String,
    generated_at: String,
    accomplishment_count: i64,
    accomplishment_ids: String,
}

fn read_insight_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InsightRow> {
    Ok(InsightRow {
        id: row.get(0)?,
        timeframe_type: row.get(1)?,
        timeframe_key: row.get(2)?,
        content: row.get(3)?,
        generated_at: row.get(4)?,
        accomplishment_count: row.get(5)?,
        accomplishment_ids: row.get(6)?,
    })
}

impl InsightRow {
    fn into_insight(self) -> Result<Insight> {
        let accomplishment_ids: BTreeSet<String> = serde_json::from_str(&self.accomplishment_ids)?;
        Ok(Insight {
            id: self.id,
            timeframe_type: self
                .timeframe_type
                .parse()
                .map_err(|_| JournalError::Storage(format!("corrupt timeframe type: {}", self.timeframe_type)))?,
            timeframe_key: BucketKey::new_unchecked(self.timeframe_key),
            content: self.content,
            generated_at: parse_timestamp(&self.generated_at)?,
            accomplishment_count: usize::try_from(self.accomplishment_count).unwrap_or(0),
            accomplishment_ids,
        })
    }
}
