//! Text-generation collaborator.
//!
//! Provides the [`TextGenerator`] trait, the insight prompt, a Gemini
//! implementation, and a placeholder used when no provider is configured.
//! Generators are created via [`create_generator`] from configuration.

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::JournalError;
use crate::journal::types::{BucketKey, Entry, Granularity};

/// The part of an entry sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub text: String,
    pub rating: u8,
}

impl From<&Entry> for SummaryItem {
    fn from(entry: &Entry) -> Self {
        Self {
            text: entry.text.clone(),
            rating: entry.rating,
        }
    }
}

/// Errors from a generation backend.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No provider or API key configured
    #[error("AI service not configured: {0}")]
    NotConfigured(String),

    /// Quota or rate limit hit
    #[error("API quota exceeded. Please try again later.")]
    RateLimited,

    /// Transport failure or server-side error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid or missing credentials
    #[error("Invalid API key: {0}")]
    Unauthorized(String),

    /// Request refused for a non-transient reason
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Response did not contain usable text
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GenerationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Network(_))
    }
}

impl From<GenerationError> for JournalError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::NotConfigured(msg) => JournalError::NotConfigured(msg),
            e if e.is_transient() => JournalError::TransientGeneration(e.to_string()),
            e @ GenerationError::Unauthorized(_) => JournalError::PermanentGeneration(e.to_string()),
            e => JournalError::GenerationRejected(e.to_string()),
        }
    }
}

/// Summarizes a timeframe's entries in a single request/response call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend identifier (e.g. model name).
    fn id(&self) -> &str;

    /// `false` when calls are certain to fail with `NotConfigured`.
    fn is_configured(&self) -> bool {
        true
    }

    async fn summarize(
        &self,
        entries: &[SummaryItem],
        timeframe_type: Granularity,
        timeframe_key: &BucketKey,
    ) -> Result<String, GenerationError>;
}

/// Stand-in used when no provider is set up. Every call fails with
/// [`GenerationError::NotConfigured`].
pub struct UnconfiguredGenerator {
    reason: String,
}

impl UnconfiguredGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    fn id(&self) -> &str {
        "none"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn summarize(
        &self,
        _entries: &[SummaryItem],
        _timeframe_type: Granularity,
        _timeframe_key: &BucketKey,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured(self.reason.clone()))
    }
}

/// Create a generator from config.
///
/// `"gemini"` without an API key and `"none"` both yield an
/// [`UnconfiguredGenerator`] so the rest of the journal keeps working.
pub fn create_generator(
    config: &crate::config::GenerationConfig,
) -> anyhow::Result<Box<dyn TextGenerator>> {
    match config.provider.as_str() {
        "gemini" => match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let generator = gemini::GeminiGenerator::new(
                    &config.base_url,
                    &config.model,
                    key,
                    std::time::Duration::from_secs(config.timeout_secs),
                )?;
                tracing::info!(model = %config.model, "gemini generator ready");
                Ok(Box::new(generator))
            }
            None => {
                tracing::warn!("GOOGLE_AI_API_KEY not set; insight generation disabled");
                Ok(Box::new(UnconfiguredGenerator::new(
                    "please configure GOOGLE_AI_API_KEY",
                )))
            }
        },
        "none" => Ok(Box::new(UnconfiguredGenerator::new(
            "generation provider is \"none\"",
        ))),
        other => anyhow::bail!("unknown generation provider: {other}. Supported: gemini, none"),
    }
}
