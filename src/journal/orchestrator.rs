//! Insight lifecycle for the selected bucket view.
//!
//! State machine: `Idle → Loading → {Ready, Failed}`, and back to `Loading`
//! on selection or an explicit generate. Generation is split into
//! [`InsightOrchestrator::begin_generate`], [`GenerationRequest::run`] and
//! [`InsightOrchestrator::complete`] so a request can outlive navigation: it
//! still persists, and its result is applied whenever its bucket is the one
//! selected at completion time. At most one request per bucket is outstanding.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::insight::{is_stale, InsightCache};
use super::types::{entry_ids, BucketKey, Entry, Granularity, Insight};
use crate::error::{JournalError, Result};
use crate::generation::{SummaryItem, TextGenerator};

/// Insight state of the current view.
#[derive(Debug, Clone, PartialEq)]
pub enum InsightState {
    /// No bucket selected.
    Idle,
    Loading,
    /// Lookup or generation finished. `None` is a cache miss.
    Ready(Option<Insight>),
    Failed(JournalError),
}

/// The bucket the orchestrator is working on.
#[derive(Debug, Clone)]
pub struct BucketView {
    pub granularity: Granularity,
    pub key: BucketKey,
    /// Bucket entries in display order (newest first).
    pub entries: Vec<Entry>,
}

impl BucketView {
    pub fn is_bucket(&self, granularity: Granularity, key: &BucketKey) -> bool {
        self.granularity == granularity && self.key == *key
    }
}

/// A generation call detached from the orchestrator.
pub struct GenerationRequest {
    id: u64,
    granularity: Granularity,
    key: BucketKey,
    items: Vec<SummaryItem>,
    entry_ids: BTreeSet<String>,
    cache: InsightCache,
    generator: Arc<dyn TextGenerator>,
}

/// Result of a [`GenerationRequest`], tagged with the bucket it was issued for.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub request_id: u64,
    pub granularity: Granularity,
    pub key: BucketKey,
    pub result: Result<Insight>,
}

impl GenerationRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &BucketKey {
        &self.key
    }

    /// Number of entries sent to the generator.
    pub fn prompt_len(&self) -> usize {
        self.items.len()
    }

    /// Call the generator, then persist the text tagged with the full id set.
    pub async fn run(self) -> GenerationOutcome {
        let Self {
            id,
            granularity,
            key,
            items,
            entry_ids,
            cache,
            generator,
        } = self;

        let result = async {
            let content = generator.summarize(&items, granularity, &key).await?;
            cache.store(granularity, &key, content, entry_ids).await
        }
        .await;

        GenerationOutcome {
            request_id: id,
            granularity,
            key,
            result,
        }
    }
}

pub struct InsightOrchestrator {
    cache: InsightCache,
    generator: Arc<dyn TextGenerator>,
    max_prompt_entries: usize,
    view: Option<BucketView>,
    state: InsightState,
    next_request_id: u64,
    /// Outstanding request id per bucket.
    in_flight: HashMap<(Granularity, BucketKey), u64>,
}

impl InsightOrchestrator {
    pub fn new(
        cache: InsightCache,
        generator: Arc<dyn TextGenerator>,
        max_prompt_entries: usize,
    ) -> Self {
        Self {
            cache,
            generator,
            max_prompt_entries,
            view: None,
            state: InsightState::Idle,
            next_request_id: 1,
            in_flight: HashMap::new(),
        }
    }

    pub fn state(&self) -> &InsightState {
        &self.state
    }

    pub fn view(&self) -> Option<&BucketView> {
        self.view.as_ref()
    }

    pub fn can_generate(&self) -> bool {
        self.generator.is_configured()
            && self
                .view
                .as_ref()
                .is_some_and(|v| !v.entries.is_empty() && !self.is_generating(v))
    }

    /// `true` while a request for the view's bucket is outstanding.
    fn is_generating(&self, view: &BucketView) -> bool {
        self.in_flight
            .contains_key(&(view.granularity, view.key.clone()))
    }

    /// The insight currently shown, if any.
    pub fn insight(&self) -> Option<&Insight> {
        match &self.state {
            InsightState::Ready(found) => found.as_ref(),
            _ => None,
        }
    }

    /// Staleness of the shown insight against the view's current entries.
    pub fn is_stale(&self) -> bool {
        match (self.insight(), &self.view) {
            (Some(insight), Some(view)) => is_stale(insight, &entry_ids(&view.entries)),
            _ => false,
        }
    }

    /// A different bucket was selected (or none). Looks up the cached insight,
    /// unless a generation for that bucket is still running.
    pub async fn select(&mut self, view: Option<BucketView>) -> &InsightState {
        self.view = view;

        let Some((granularity, key)) = self.view.as_ref().map(|v| (v.granularity, v.key.clone()))
        else {
            self.state = InsightState::Idle;
            return &self.state;
        };

        self.state = InsightState::Loading;
        if self.in_flight.contains_key(&(granularity, key.clone())) {
            tracing::debug!(timeframe = %key, "generation still running for selected bucket");
            return &self.state;
        }
        self.state = match self.cache.lookup(granularity, &key).await {
            Ok(found) => InsightState::Ready(found),
            Err(JournalError::NotConfigured(reason)) => {
                tracing::warn!(%reason, "insight storage unavailable");
                InsightState::Ready(None)
            }
            Err(err) => {
                tracing::warn!(timeframe = %key, error = %err, "insight lookup failed");
                InsightState::Failed(err)
            }
        };
        &self.state
    }

    /// Same bucket, different entries. Staleness follows without a lookup.
    pub fn update_entries(&mut self, entries: Vec<Entry>) {
        if let Some(view) = self.view.as_mut() {
            view.entries = entries;
        }
    }

    /// Start a generation for the current view.
    ///
    /// Refuses with `Precondition` when there is no view or it has no entries,
    /// and with `InFlight` while an earlier request for the same bucket is
    /// outstanding. Neither refusal touches state.
    pub fn begin_generate(&mut self) -> Result<GenerationRequest> {
        let view = self
            .view
            .as_ref()
            .ok_or_else(|| JournalError::Precondition("no timeframe selected".into()))?;
        if view.entries.is_empty() {
            return Err(JournalError::Precondition(
                "cannot generate insight for empty accomplishments".into(),
            ));
        }
        if self.is_generating(view) {
            return Err(JournalError::InFlight(Insight::composite_id(
                view.granularity,
                &view.key,
            )));
        }

        let items: Vec<SummaryItem> = view
            .entries
            .iter()
            .take(self.max_prompt_entries)
            .map(SummaryItem::from)
            .collect();

        let request = GenerationRequest {
            id: self.next_request_id,
            granularity: view.granularity,
            key: view.key.clone(),
            items,
            entry_ids: entry_ids(&view.entries),
            cache: self.cache.clone(),
            generator: Arc::clone(&self.generator),
        };

        tracing::info!(
            request = request.id,
            timeframe = %request.key,
            entries = view.entries.len(),
            sent = request.items.len(),
            "generating insight"
        );

        self.next_request_id += 1;
        self.in_flight
            .insert((request.granularity, request.key.clone()), request.id);
        self.state = InsightState::Loading;
        Ok(request)
    }

    /// Apply an outcome. Returns `false` if it was discarded because its
    /// bucket is not the one selected now.
    pub fn complete(&mut self, outcome: GenerationOutcome) -> bool {
        let slot = (outcome.granularity, outcome.key.clone());
        if self.in_flight.get(&slot) == Some(&outcome.request_id) {
            self.in_flight.remove(&slot);
        }

        let selected = self
            .view
            .as_ref()
            .is_some_and(|v| v.is_bucket(outcome.granularity, &outcome.key));
        if !selected {
            tracing::debug!(
                request = outcome.request_id,
                timeframe = %outcome.key,
                "discarding result for a bucket no longer selected"
            );
            return false;
        }
        self.state = match outcome.result {
            Ok(insight) => InsightState::Ready(Some(insight)),
            Err(err) => {
                tracing::warn!(timeframe = %outcome.key, error = %err, "insight generation failed");
                InsightState::Failed(err)
            }
        };
        true
    }

    /// Generate (or regenerate) the insight for the current view.
    pub async fn generate(&mut self) -> Result<Insight> {
        let request = self.begin_generate()?;
        let outcome = request.run().await;
        let result = outcome.result.clone();
        self.complete(outcome);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::journal::store::SqliteStore;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGenerator {
        calls: AtomicUsize,
        last_len: AtomicUsize,
        fail_with: Mutex<Option<GenerationError>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        fn id(&self) -> &str {
            "recording"
        }

        async fn summarize(
            &self,
            entries: &[SummaryItem],
            _timeframe_type: Granularity,
            timeframe_key: &BucketKey,
        ) -> std::result::Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_len.store(entries.len(), Ordering::SeqCst);
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            Ok(format!("summary of {timeframe_key}"))
        }
    }

    fn entries(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| Entry {
                id: format!("e{i:03}"),
                text: format!("thing {i}"),
                rating: (i % 10 + 1) as u8,
                timestamp: FixedOffset::east_opt(0)
                    .unwrap()
                    .with_ymd_and_hms(2026, 2, 1, 0, 0, 0)
                    .unwrap(),
            })
            .collect()
    }

    fn view(key: &str, entries: Vec<Entry>) -> BucketView {
        BucketView {
            granularity: Granularity::Month,
            key: BucketKey::new_unchecked(key),
            entries,
        }
    }

    fn orchestrator(generator: Arc<RecordingGenerator>) -> InsightOrchestrator {
        let store = SqliteStore::new(crate::db::open_memory_database().unwrap());
        let cache = InsightCache::new(Arc::new(store), "me");
        InsightOrchestrator::new(cache, generator, 100)
    }

    #[tokio::test]
    async fn starts_idle_and_miss_is_ready_none() {
        let mut orch = orchestrator(Arc::default());
        assert_eq!(orch.state(), &InsightState::Idle);
        let state = orch.select(Some(view("2026-02", entries(2)))).await;
        assert_eq!(state, &InsightState::Ready(None));
        assert!(!orch.is_stale());
    }

    #[tokio::test]
    async fn generate_stores_and_becomes_ready() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut orch = orchestrator(Arc::clone(&generator));
        orch.select(Some(view("2026-02", entries(3)))).await;

        let insight = orch.generate().await.unwrap();
        assert_eq!(insight.content, "summary of 2026-02");
        assert_eq!(insight.accomplishment_count, 3);
        assert_eq!(orch.insight(), Some(&insight));
        assert!(!orch.is_stale());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_bucket_refuses_without_calling_generator() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut orch = orchestrator(Arc::clone(&generator));
        orch.select(Some(view("2026-02", Vec::new()))).await;

        let err = orch.generate().await.unwrap_err();
        assert!(matches!(err, JournalError::Precondition(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orch.state(), &InsightState::Ready(None));
    }

    #[tokio::test]
    async fn truncates_prompt_but_tracks_every_id() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut orch = orchestrator(Arc::clone(&generator));
        orch.select(Some(view("2026-02", entries(130)))).await;

        let insight = orch.generate().await.unwrap();
        assert_eq!(generator.last_len.load(Ordering::SeqCst), 100);
        assert_eq!(insight.accomplishment_count, 130);
        assert!(insight.accomplishment_ids.contains("e129"));
    }

    #[tokio::test]
    async fn failure_is_retriable_by_generating_again() {
        let generator = Arc::new(RecordingGenerator::default());
        *generator.fail_with.lock().unwrap() = Some(GenerationError::RateLimited);
        let mut orch = orchestrator(Arc::clone(&generator));
        orch.select(Some(view("2026-02", entries(1)))).await;

        let err = orch.generate().await.unwrap_err();
        assert!(matches!(err, JournalError::TransientGeneration(_)));
        assert!(matches!(orch.state(), InsightState::Failed(_)));

        orch.generate().await.unwrap();
        assert!(orch.insight().is_some());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn overlapping_generate_is_refused() {
        let mut orch = orchestrator(Arc::default());
        orch.select(Some(view("2026-02", entries(1)))).await;

        let first = orch.begin_generate().unwrap();
        assert_eq!(orch.state(), &InsightState::Loading);
        assert!(matches!(orch.begin_generate(), Err(JournalError::InFlight(_))));

        let outcome = first.run().await;
        assert!(orch.complete(outcome));
        assert!(orch.insight().is_some());
    }

    #[tokio::test]
    async fn result_for_abandoned_bucket_is_discarded_but_persisted() {
        let mut orch = orchestrator(Arc::default());
        orch.select(Some(view("2026-02", entries(2)))).await;
        let request = orch.begin_generate().unwrap();

        orch.select(Some(view("2026-03", entries(1)))).await;
        let outcome = request.run().await;
        assert!(outcome.result.is_ok());
        assert!(!orch.complete(outcome));
        assert_eq!(orch.state(), &InsightState::Ready(None));

        let state = orch.select(Some(view("2026-02", entries(2)))).await;
        assert!(matches!(state, InsightState::Ready(Some(_))));
    }

    #[tokio::test]
    async fn result_applies_after_navigating_away_and_back() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut orch = orchestrator(Arc::clone(&generator));
        orch.select(Some(view("2026-02", entries(2)))).await;
        let request = orch.begin_generate().unwrap();

        orch.select(Some(view("2026-03", entries(1)))).await;
        let state = orch.select(Some(view("2026-02", entries(2)))).await;
        assert_eq!(state, &InsightState::Loading);
        assert!(!orch.can_generate());
        assert!(matches!(orch.begin_generate(), Err(JournalError::InFlight(_))));

        let outcome = request.run().await;
        assert!(orch.complete(outcome));
        let insight = orch.insight().unwrap();
        assert_eq!(insight.content, "summary of 2026-02");
        assert!(orch.can_generate());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_bucket_can_generate_while_one_is_running() {
        let mut orch = orchestrator(Arc::default());
        orch.select(Some(view("2026-02", entries(2)))).await;
        let first = orch.begin_generate().unwrap();

        orch.select(Some(view("2026-03", entries(1)))).await;
        assert!(orch.can_generate());
        let second = orch.begin_generate().unwrap();

        assert!(!orch.complete(first.run().await));
        assert!(orch.complete(second.run().await));
        assert_eq!(orch.insight().unwrap().timeframe_key.as_str(), "2026-03");

        let state = orch.select(Some(view("2026-02", entries(2)))).await;
        assert!(matches!(state, InsightState::Ready(Some(_))));
    }

    #[tokio::test]
    async fn new_entry_in_bucket_makes_insight_stale() {
        let mut orch = orchestrator(Arc::default());
        let mut current = entries(2);
        orch.select(Some(view("2026-02", current.clone()))).await;
        orch.generate().await.unwrap();
        assert!(!orch.is_stale());

        current.extend(entries(3).into_iter().skip(2));
        orch.update_entries(current);
        assert!(orch.is_stale());
    }

    #[tokio::test]
    async fn deselecting_returns_to_idle() {
        let mut orch = orchestrator(Arc::default());
        orch.select(Some(view("2026-02", entries(1)))).await;
        assert_eq!(orch.select(None).await, &InsightState::Idle);
        assert!(matches!(orch.begin_generate(), Err(JournalError::Precondition(_))));
    }
}
