//! One owner's journal held in memory, driven by explicit events.
//!
//! Each event (entries reloaded, entry added, owner changed, granularity
//! switched, bucket stepped or selected) updates the navigator and then
//! re-derives the bucket view. If the view still points at the same bucket the
//! orchestrator only gets the new entries (so staleness follows); otherwise
//! the cached insight for the new bucket is looked up.

use std::sync::Arc;

use super::aggregate::{self, Bucket, TimeframeSummary};
use super::insight::InsightCache;
use super::navigator::BucketNavigator;
use super::orchestrator::{BucketView, InsightOrchestrator, InsightState};
use super::store::JournalStore;
use super::types::{BucketKey, Entry, Granularity, Insight, NewEntry};
use crate::error::{JournalError, Result};
use crate::generation::TextGenerator;

pub struct JournalSession {
    store: Arc<dyn JournalStore>,
    generator: Arc<dyn TextGenerator>,
    max_prompt_entries: usize,
    owner: String,
    entries: Vec<Entry>,
    navigator: BucketNavigator,
    orchestrator: InsightOrchestrator,
}

impl JournalSession {
    /// Load the owner's entries and select the newest bucket.
    pub async fn load(
        store: Arc<dyn JournalStore>,
        generator: Arc<dyn TextGenerator>,
        owner: impl Into<String>,
        granularity: Granularity,
        max_prompt_entries: usize,
    ) -> Result<Self> {
        let owner = owner.into();
        let orchestrator = InsightOrchestrator::new(
            InsightCache::new(Arc::clone(&store), owner.clone()),
            Arc::clone(&generator),
            max_prompt_entries,
        );
        let mut session = Self {
            store,
            generator,
            max_prompt_entries,
            owner,
            entries: Vec::new(),
            navigator: BucketNavigator::new(&[], granularity),
            orchestrator,
        };
        session.reload().await?;
        Ok(session)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn navigator(&self) -> &BucketNavigator {
        &self.navigator
    }

    pub fn granularity(&self) -> Granularity {
        self.navigator.granularity()
    }

    pub fn selected_key(&self) -> Option<&BucketKey> {
        self.navigator.selected_key()
    }

    pub fn insight_state(&self) -> &InsightState {
        self.orchestrator.state()
    }

    pub fn insight(&self) -> Option<&Insight> {
        self.orchestrator.insight()
    }

    pub fn is_stale(&self) -> bool {
        self.orchestrator.is_stale()
    }

    pub fn can_generate(&self) -> bool {
        self.orchestrator.can_generate()
    }

    /// The selected bucket with its entries and stats.
    pub fn current_bucket(&self) -> Option<Bucket> {
        let key = self.navigator.selected_key()?;
        Some(aggregate::bucket(&self.entries, key, self.granularity()))
    }

    /// All buckets at the current granularity, newest first.
    pub fn timeframes(&self) -> Vec<TimeframeSummary> {
        aggregate::timeframes(&self.entries, self.granularity())
    }

    /// Re-read the entry collection from storage.
    ///
    /// With no owner identity the journal degrades to empty.
    pub async fn reload(&mut self) -> Result<()> {
        self.entries = match self.store.list_entries(&self.owner).await {
            Ok(entries) => entries,
            Err(JournalError::NotConfigured(reason)) => {
                tracing::warn!(%reason, "journal storage unavailable, showing empty journal");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        tracing::debug!(owner = %self.owner, entries = self.entries.len(), "journal loaded");
        self.navigator.entries_changed(&self.entries);
        self.sync_view(false).await;
        Ok(())
    }

    /// The signed-in identity changed. Everything is re-read from scratch.
    pub async fn owner_changed(&mut self, owner: impl Into<String>) -> Result<()> {
        self.owner = owner.into();
        tracing::info!(owner = %self.owner, "owner changed");
        self.orchestrator = InsightOrchestrator::new(
            InsightCache::new(Arc::clone(&self.store), self.owner.clone()),
            Arc::clone(&self.generator),
            self.max_prompt_entries,
        );
        self.navigator = BucketNavigator::new(&[], self.granularity());
        self.reload().await
    }

    /// Persist a new entry and fold it into the in-memory collection.
    pub async fn add_entry(&mut self, entry: NewEntry) -> Result<Entry> {
        let saved = self.store.add_entry(&self.owner, entry).await?;
        self.entries.insert(0, saved.clone());
        self.navigator.entries_changed(&self.entries);
        self.sync_view(false).await;
        Ok(saved)
    }

    pub async fn set_granularity(&mut self, granularity: Granularity) {
        self.navigator.set_granularity(granularity, &self.entries);
        self.sync_view(false).await;
    }

    pub async fn select(&mut self, key: &BucketKey) -> Result<()> {
        self.navigator.select(key)?;
        self.sync_view(false).await;
        Ok(())
    }

    /// Move to the next-older bucket.
    pub async fn step_previous(&mut self) -> Result<()> {
        self.navigator.step_previous()?;
        self.sync_view(false).await;
        Ok(())
    }

    /// Move to the next-newer bucket.
    pub async fn step_next(&mut self) -> Result<()> {
        self.navigator.step_next()?;
        self.sync_view(false).await;
        Ok(())
    }

    /// Re-run the cache lookup for the current bucket.
    pub async fn refresh_insight(&mut self) {
        self.sync_view(true).await;
    }

    /// Generate (or regenerate) the insight for the selected bucket.
    pub async fn generate_insight(&mut self) -> Result<Insight> {
        self.orchestrator.generate().await
    }

    async fn sync_view(&mut self, force_lookup: bool) {
        let granularity = self.granularity();
        let view = self.navigator.selected_key().map(|key| BucketView {
            granularity,
            key: key.clone(),
            entries: aggregate::bucket_entries(&self.entries, key, granularity),
        });

        let same_bucket = match (&view, self.orchestrator.view()) {
            (Some(next), Some(current)) => current.is_bucket(next.granularity, &next.key),
            (None, None) => true,
            _ => false,
        };

        match view {
            Some(view) if same_bucket && !force_lookup => {
                self.orchestrator.update_entries(view.entries);
            }
            None if same_bucket => {}
            view => {
                self.orchestrator.select(view).await;
            }
        }
    }
}
