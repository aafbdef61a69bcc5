#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use accomplish::db;
use accomplish::generation::{GenerationError, SummaryItem, TextGenerator};
use accomplish::journal::store::SqliteStore;
use accomplish::journal::types::{BucketKey, Granularity, NewEntry};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};

/// A fresh in-memory store with schema and migrations applied.
pub fn test_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::new(db::open_memory_database().unwrap()))
}

/// Timestamp at 09:00 on the given day, UTC+2.
pub fn ts(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, 9, 0, 0)
        .unwrap()
}

pub fn new_entry(text: &str, rating: i64, at: DateTime<FixedOffset>) -> NewEntry {
    NewEntry::new(text, rating, Some(at)).unwrap()
}

pub fn key(raw: &str) -> BucketKey {
    BucketKey::new_unchecked(raw)
}

pub fn ids<'a>(raw: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    raw.into_iter().map(String::from).collect()
}

/// Generator double that counts calls and records what it was sent.
#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
    sent: Mutex<Vec<Vec<SummaryItem>>>,
    fail_next: Mutex<Option<GenerationError>>,
}

impl FakeGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_sent(&self) -> Vec<SummaryItem> {
        self.sent.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn fail_next(&self, err: GenerationError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn id(&self) -> &str {
        "fake"
    }

    async fn summarize(
        &self,
        entries: &[SummaryItem],
        timeframe_type: Granularity,
        timeframe_key: &BucketKey,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(entries.to_vec());
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        Ok(format!(
            "{} accomplishments in {timeframe_type} {timeframe_key}",
            entries.len()
        ))
    }
}
