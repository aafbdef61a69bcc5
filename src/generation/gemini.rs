//! Google Gemini `generateContent` backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::prompt::build_insight_prompt;
use super::{GenerationError, SummaryItem, TextGenerator};
use crate::journal::types::{BucketKey, Granularity};

/// Gemini REST client.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Classify a non-success HTTP response.
fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let lowered = body.to_ascii_lowercase();
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Unauthorized(format!("HTTP {status}"))
        }
        s if s.is_client_error() && lowered.contains("api key") => {
            GenerationError::Unauthorized(format!("HTTP {status}"))
        }
        s if s.is_client_error() && lowered.contains("quota") => GenerationError::RateLimited,
        s if s.is_server_error() => GenerationError::Network(format!("HTTP {status}")),
        s => GenerationError::Rejected(format!("HTTP {s}: {}", truncate(body, 200))),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn id(&self) -> &str {
        &self.model
    }

    async fn summarize(
        &self,
        entries: &[SummaryItem],
        timeframe_type: Granularity,
        timeframe_key: &BucketKey,
    ) -> Result<String, GenerationError> {
        let prompt = build_insight_prompt(entries, timeframe_type, timeframe_key);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        tracing::debug!(
            model = %self.model,
            entries = entries.len(),
            timeframe = %timeframe_key,
            "requesting insight"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = classify_failure(status, &text);
            tracing::warn!(%status, error = %err, "insight generation failed");
            return Err(err);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::Parse("response contained no text".into()));
        }
        Ok(text.to_string())
    }
}
