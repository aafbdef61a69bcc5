//! Current-bucket selection with prev/next stepping.
//!
//! Keys are held newest first. "Previous" moves to an older bucket (higher
//! index), "next" to a newer one. Whenever the selection falls out of the key
//! sequence the newest key is auto-selected.

use super::aggregate::distinct_keys;
use super::types::{BucketKey, Entry, Granularity};
use crate::error::{JournalError, Result};

#[derive(Debug, Clone)]
pub struct BucketNavigator {
    granularity: Granularity,
    keys: Vec<BucketKey>,
    selected: Option<BucketKey>,
}

impl BucketNavigator {
    pub fn new(entries: &[Entry], granularity: Granularity) -> Self {
        let mut nav = Self {
            granularity,
            keys: Vec::new(),
            selected: None,
        };
        nav.entries_changed(entries);
        nav
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Distinct keys, newest first.
    pub fn keys(&self) -> &[BucketKey] {
        &self.keys
    }

    pub fn selected_key(&self) -> Option<&BucketKey> {
        self.selected.as_ref()
    }

    /// Recompute keys after the entry set changed. Keeps the selection if it
    /// still exists.
    pub fn entries_changed(&mut self, entries: &[Entry]) {
        self.keys = distinct_keys(entries, self.granularity);
        self.reconcile();
    }

    /// Switch granularity. The old selection is not mapped to the new width;
    /// the newest bucket is selected.
    pub fn set_granularity(&mut self, granularity: Granularity, entries: &[Entry]) {
        if granularity != self.granularity {
            self.selected = None;
        }
        self.granularity = granularity;
        self.entries_changed(entries);
    }

    /// Select an explicit key. Fails if it is not in the current sequence.
    pub fn select(&mut self, key: &BucketKey) -> Result<()> {
        if !self.keys.contains(key) {
            return Err(JournalError::Navigation(format!(
                "no {} bucket {key}",
                self.granularity
            )));
        }
        self.selected = Some(key.clone());
        Ok(())
    }

    pub fn has_previous(&self) -> bool {
        self.position()
            .is_some_and(|idx| idx + 1 < self.keys.len())
    }

    pub fn has_next(&self) -> bool {
        self.position().is_some_and(|idx| idx > 0)
    }

    /// Step to the next-older bucket.
    pub fn step_previous(&mut self) -> Result<&BucketKey> {
        match self.position() {
            Some(idx) if idx + 1 < self.keys.len() => Ok(self.select_index(idx + 1)),
            _ => Err(JournalError::Navigation("no older bucket".into())),
        }
    }

    /// Step to the next-newer bucket.
    pub fn step_next(&mut self) -> Result<&BucketKey> {
        match self.position() {
            Some(idx) if idx > 0 => Ok(self.select_index(idx - 1)),
            _ => Err(JournalError::Navigation("no newer bucket".into())),
        }
    }

    fn select_index(&mut self, idx: usize) -> &BucketKey {
        self.selected.insert(self.keys[idx].clone())
    }

    fn position(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.keys.iter().position(|k| k == selected)
    }

    fn reconcile(&mut self) {
        if self.position().is_none() {
            self.selected = self.keys.first().cloned();
        }
    }
}
