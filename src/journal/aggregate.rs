//! Partition entries into month/year buckets and summarize them.

use std::collections::BTreeSet;

use serde::Serialize;

use super::timekey::{bucket_key, bucket_label};
use super::types::{BucketKey, BucketStats, Entry, Granularity};

/// A derived bucket: the entries sharing a key plus their statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Bucket {
    pub granularity: Granularity,
    pub key: BucketKey,
    pub label: String,
    /// Most recent first.
    pub entries: Vec<Entry>,
    pub stats: BucketStats,
}

/// One row of a timeframe listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeSummary {
    pub key: BucketKey,
    pub label: String,
    pub stats: BucketStats,
}

/// Distinct bucket keys, newest first.
pub fn distinct_keys(entries: &[Entry], granularity: Granularity) -> Vec<BucketKey> {
    let keys: BTreeSet<BucketKey> = entries
        .iter()
        .map(|e| bucket_key(&e.timestamp, granularity))
        .collect();
    keys.into_iter().rev().collect()
}

/// Entries falling in `key`, sorted by timestamp descending.
///
/// The sort is stable, so entries with equal timestamps keep their input order.
pub fn bucket_entries(entries: &[Entry], key: &BucketKey, granularity: Granularity) -> Vec<Entry> {
    let mut selected: Vec<Entry> = entries
        .iter()
        .filter(|e| bucket_key(&e.timestamp, granularity) == *key)
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected
}

/// Count and mean rating.
pub fn stats(entries: &[Entry]) -> BucketStats {
    let count = entries.len();
    let average_rating = if count == 0 {
        0.0
    } else {
        let sum: u32 = entries.iter().map(|e| u32::from(e.rating)).sum();
        f64::from(sum) / count as f64
    };
    BucketStats {
        count,
        average_rating,
    }
}

/// Build the full [`Bucket`] for a key.
pub fn bucket(entries: &[Entry], key: &BucketKey, granularity: Granularity) -> Bucket {
    let entries = bucket_entries(entries, key, granularity);
    let stats = stats(&entries);
    Bucket {
        granularity,
        label: bucket_label(key, granularity),
        key: key.clone(),
        entries,
        stats,
    }
}

/// Every bucket at this granularity with its label and stats, newest first.
pub fn timeframes(entries: &[Entry], granularity: Granularity) -> Vec<TimeframeSummary> {
    distinct_keys(entries, granularity)
        .into_iter()
        .map(|key| {
            let in_bucket = bucket_entries(entries, &key, granularity);
            TimeframeSummary {
                label: bucket_label(&key, granularity),
                stats: stats(&in_bucket),
                key,
            }
        })
        .collect()
}
