//! Core journal type definitions.
//!
//! Defines [`Entry`] (an immutable accomplishment), [`NewEntry`] (validated
//! input for creating one), [`Granularity`] and [`BucketKey`] (timeframe
//! identity), [`BucketStats`], and [`Insight`] (a cached generated summary).

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, FixedOffset, Local};
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

/// Lowest accepted impact rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted impact rating.
pub const MAX_RATING: u8 = 10;

/// Entry years must fit a four-digit bucket key.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// Bucketing width for timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Granularity {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(JournalError::Validation(format!(
                "invalid timeframe type: {s}. Must be \"month\" or \"year\""
            ))),
        }
    }
}

/// Identifier of a time bucket: `YYYY-MM` for months, `YYYY` for years.
///
/// Keys are zero-padded, so lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketKey(String);

impl BucketKey {
    /// Wrap a raw key without checking its format.
    ///
    /// Use [`crate::journal::timekey::parse_bucket_key`] for untrusted input.
    pub fn new_unchecked(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A logged accomplishment. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// UUID v7 assigned at creation.
    pub id: String,
    /// Trimmed, non-empty description.
    pub text: String,
    /// Impact rating in `1..=10`.
    pub rating: u8,
    /// When it happened, in the author's local offset.
    pub timestamp: DateTime<FixedOffset>,
}

/// Validated input for a new entry. The id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    text: String,
    rating: u8,
    timestamp: DateTime<FixedOffset>,
}

impl NewEntry {
    /// Validate raw input. Text is trimmed; a missing timestamp means now.
    pub fn new(
        text: &str,
        rating: i64,
        timestamp: Option<DateTime<FixedOffset>>,
    ) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(JournalError::Validation("text is required".into()));
        }
        if !(i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&rating) {
            return Err(JournalError::Validation(format!(
                "rating must be a number between {MIN_RATING} and {MAX_RATING}, got {rating}"
            )));
        }
        let timestamp = timestamp.unwrap_or_else(|| Local::now().fixed_offset());
        if !YEAR_RANGE.contains(&timestamp.year()) {
            return Err(JournalError::Validation(format!(
                "timestamp year {} is outside 0000-9999",
                timestamp.year()
            )));
        }
        Ok(Self {
            text: text.to_string(),
            rating: rating as u8,
            timestamp,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Attach the storage-assigned id.
    pub fn into_entry(self, id: String) -> Entry {
        Entry {
            id,
            text: self.text,
            rating: self.rating,
            timestamp: self.timestamp,
        }
    }
}

/// Summary statistics for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub count: usize,
    /// Arithmetic mean of ratings; `0.0` for an empty bucket.
    pub average_rating: f64,
}

/// A cached generated summary for one `(timeframe_type, timeframe_key)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Composite identifier `"{timeframe_type}_{timeframe_key}"`.
    pub id: String,
    pub timeframe_type: Granularity,
    pub timeframe_key: BucketKey,
    /// Generated markdown text.
    pub content: String,
    pub generated_at: DateTime<FixedOffset>,
    pub accomplishment_count: usize,
    /// Ids of every entry in the bucket at generation time.
    pub accomplishment_ids: BTreeSet<String>,
}

impl Insight {
    /// Upsert key for an insight record.
    pub fn composite_id(timeframe_type: Granularity, timeframe_key: &BucketKey) -> String {
        format!("{timeframe_type}_{timeframe_key}")
    }
}

/// Collect the id set of a slice of entries.
pub fn entry_ids(entries: &[Entry]) -> BTreeSet<String> {
    entries.iter().map(|e| e.id.clone()).collect()
}
