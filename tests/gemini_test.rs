use std::time::Duration;

use accomplish::error::JournalError;
use accomplish::generation::gemini::GeminiGenerator;
use accomplish::generation::{GenerationError, SummaryItem, TextGenerator};
use accomplish::journal::types::{BucketKey, Granularity};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-pro:generateContent";

fn generator(server: &MockServer) -> GeminiGenerator {
    GeminiGenerator::new(&server.uri(), "gemini-pro", "test-key", Duration::from_secs(5)).unwrap()
}

fn items() -> Vec<SummaryItem> {
    vec![
        SummaryItem {
            text: "Shipped the importer".into(),
            rating: 6,
        },
        SummaryItem {
            text: "Led the design review".into(),
            rating: 9,
        },
    ]
}

async fn summarize(server: &MockServer) -> Result<String, GenerationError> {
    generator(server)
        .summarize(&items(), Granularity::Month, &BucketKey::new_unchecked("2026-02"))
        .await
}

#[tokio::test]
async fn returns_first_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("February 2026"))
        .and(body_string_contains("[Impact: 9/10] Led the design review"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "A strong month." }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(summarize(&server).await.unwrap(), "A strong month.");
}

#[tokio::test]
async fn rate_limit_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = summarize(&server).await.unwrap_err();
    assert!(matches!(err, GenerationError::RateLimited));
    assert!(JournalError::from(err).is_retriable());
}

#[tokio::test]
async fn quota_message_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":{"message":"Quota exceeded"}}"#),
        )
        .mount(&server)
        .await;

    assert!(matches!(
        summarize(&server).await.unwrap_err(),
        GenerationError::RateLimited
    ));
}

#[tokio::test]
async fn bad_key_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":{"message":"API key not valid"}}"#),
        )
        .mount(&server)
        .await;

    let err = summarize(&server).await.unwrap_err();
    assert!(matches!(err, GenerationError::Unauthorized(_)));
    assert!(matches!(
        JournalError::from(err),
        JournalError::PermanentGeneration(_)
    ));
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = summarize(&server).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn empty_candidates_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    assert!(matches!(
        summarize(&server).await.unwrap_err(),
        GenerationError::Parse(_)
    ));
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let generator = GeminiGenerator::new(
        "http://127.0.0.1:9",
        "gemini-pro",
        "test-key",
        Duration::from_secs(2),
    )
    .unwrap();
    let err = generator
        .summarize(&items(), Granularity::Year, &BucketKey::new_unchecked("2026"))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)));
}
