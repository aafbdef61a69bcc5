//! Error taxonomy shared by the journal core and its collaborators.
//!
//! Pure components (time keys, aggregation, navigation) only fail on caller
//! bugs. The insight cache and orchestrator fail on collaborator errors, which
//! are surfaced rather than swallowed. A cache miss is never an error.

use thiserror::Error;

/// Errors surfaced by the journal core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    /// Malformed rating, text, or timeframe input. Rejected before storage.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Storage or generation collaborator is unavailable.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Rate limit or network failure. Retry by generating again.
    #[error("generation temporarily unavailable: {0}")]
    TransientGeneration(String),

    /// Auth or configuration failure on the generation side. Not retried.
    #[error("generation failed: {0}")]
    PermanentGeneration(String),

    /// The model refused the request or returned no usable text. Not retried.
    #[error("generation rejected: {0}")]
    GenerationRejected(String),

    /// Stepping past the ends of the bucket sequence.
    #[error("navigation out of bounds: {0}")]
    Navigation(String),

    /// Operation refused because its precondition does not hold.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A generation is already running for the selected bucket.
    #[error("generation already in progress for {0}")]
    InFlight(String),

    /// The storage collaborator failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl JournalError {
    /// `true` for failures a caller may retry by repeating the same action.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::TransientGeneration(_) | Self::InFlight(_))
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("corrupt record: {err}"))
    }
}

impl From<tokio::task::JoinError> for JournalError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Storage(format!("db task failed: {err}"))
    }
}

pub type Result<T, E = JournalError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_kinds_are_retriable() {
        assert!(JournalError::TransientGeneration("429".into()).is_retriable());
        assert!(JournalError::InFlight("month_2026-02".into()).is_retriable());
        assert!(!JournalError::PermanentGeneration("bad key".into()).is_retriable());
        assert!(!JournalError::GenerationRejected("empty".into()).is_retriable());
        assert!(!JournalError::Validation("rating".into()).is_retriable());
        assert!(!JournalError::NotConfigured("no key".into()).is_retriable());
    }

    #[test]
    fn sqlite_errors_become_storage_errors() {
        let err: JournalError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, JournalError::Storage(_)));
    }
}
