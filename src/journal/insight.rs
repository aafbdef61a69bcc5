//! Insight cache: lookup, staleness, and upsert of generated summaries.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Local;

use super::store::JournalStore;
use super::types::{BucketKey, Granularity, Insight};
use crate::error::Result;

/// Owner-bound view of the insight records in a [`JournalStore`].
#[derive(Clone)]
pub struct InsightCache {
    store: Arc<dyn JournalStore>,
    owner: String,
}

impl InsightCache {
    pub fn new(store: Arc<dyn JournalStore>, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Cached insight for an exact pair. A miss is `Ok(None)`.
    pub async fn lookup(
        &self,
        timeframe_type: Granularity,
        timeframe_key: &BucketKey,
    ) -> Result<Option<Insight>> {
        let found = self
            .store
            .get_insight(&self.owner, timeframe_type, timeframe_key)
            .await?;
        tracing::debug!(
            timeframe_type = %timeframe_type,
            timeframe_key = %timeframe_key,
            hit = found.is_some(),
            "insight lookup"
        );
        Ok(found)
    }

    /// Stamp and upsert an insight at `"{type}_{key}"`.
    pub async fn store(
        &self,
        timeframe_type: Granularity,
        timeframe_key: &BucketKey,
        content: String,
        entry_ids: BTreeSet<String>,
    ) -> Result<Insight> {
        let insight = Insight {
            id: Insight::composite_id(timeframe_type, timeframe_key),
            timeframe_type,
            timeframe_key: timeframe_key.clone(),
            content,
            generated_at: Local::now().fixed_offset(),
            accomplishment_count: entry_ids.len(),
            accomplishment_ids: entry_ids,
        };
        let saved = self.store.put_insight(&self.owner, &insight).await?;
        tracing::info!(id = %saved.id, entries = saved.accomplishment_count, "insight saved");
        Ok(saved)
    }
}

/// `true` iff the ids the insight was generated from differ from the current
/// bucket's ids in size or membership.
pub fn is_stale(insight: &Insight, current_entry_ids: &BTreeSet<String>) -> bool {
    insight.accomplishment_ids != *current_entry_ids
}
