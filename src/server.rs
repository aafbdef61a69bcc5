//! JSON HTTP API over the journal.
//!
//! Every request is scoped to an owner taken from the `x-owner-id` header,
//! falling back to the configured owner. Handlers are stateless apart from the
//! shared store, generator, and the set of generations currently running.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use accomplish::config::AccomplishConfig;
use accomplish::db;
use accomplish::error::JournalError;
use accomplish::generation::{create_generator, TextGenerator};
use accomplish::journal::aggregate::{self, TimeframeSummary};
use accomplish::journal::insight::{is_stale, InsightCache};
use accomplish::journal::orchestrator::{BucketView, InsightOrchestrator};
use accomplish::journal::store::{JournalStore, SqliteStore};
use accomplish::journal::timekey::parse_bucket_key;
use accomplish::journal::types::{entry_ids, Entry, Granularity, Insight, NewEntry};
use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

const OWNER_HEADER: &str = "x-owner-id";

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn JournalStore>,
    generator: Arc<dyn TextGenerator>,
    default_owner: String,
    max_prompt_entries: usize,
    generating: Arc<Mutex<HashSet<String>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JournalStore>,
        generator: Arc<dyn TextGenerator>,
        default_owner: impl Into<String>,
        max_prompt_entries: usize,
    ) -> Self {
        Self {
            store,
            generator,
            default_owner: default_owner.into(),
            max_prompt_entries,
            generating: Arc::default(),
        }
    }

    fn owner(&self, headers: &HeaderMap) -> String {
        headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_owner)
            .to_string()
    }

    /// Claim the `(owner, insight id)` slot, or fail with `InFlight`.
    fn claim(&self, owner: &str, insight_id: &str) -> Result<GenerationSlot, JournalError> {
        let slot = format!("{owner}\u{0}{insight_id}");
        let mut running = self
            .generating
            .lock()
            .map_err(|e| JournalError::Storage(format!("generation set poisoned: {e}")))?;
        if !running.insert(slot.clone()) {
            return Err(JournalError::InFlight(insight_id.to_string()));
        }
        Ok(GenerationSlot {
            running: Arc::clone(&self.generating),
            slot,
        })
    }
}

/// Releases its slot in the running-generation set on drop.
struct GenerationSlot {
    running: Arc<Mutex<HashSet<String>>>,
    slot: String,
}

impl Drop for GenerationSlot {
    fn drop(&mut self) {
        if let Ok(mut running) = self.running.lock() {
            running.remove(&self.slot);
        }
    }
}

/// [`JournalError`] rendered as a JSON error response.
pub struct ApiError(JournalError);

impl From<JournalError> for ApiError {
    fn from(err: JournalError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(JournalError::Validation(rejection.body_text()))
    }
}

pub fn status_for(err: &JournalError) -> StatusCode {
    match err {
        JournalError::Validation(_) | JournalError::Precondition(_) => StatusCode::BAD_REQUEST,
        JournalError::Navigation(_) => StatusCode::NOT_FOUND,
        JournalError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        JournalError::TransientGeneration(_) => StatusCode::TOO_MANY_REQUESTS,
        JournalError::PermanentGeneration(_) => StatusCode::UNAUTHORIZED,
        JournalError::GenerationRejected(_) => StatusCode::BAD_GATEWAY,
        JournalError::InFlight(_) => StatusCode::CONFLICT,
        JournalError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        let body = serde_json::json!({
            "error": self.0.to_string(),
            "retriable": self.0.is_retriable(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct NewAccomplishment {
    text: String,
    rating: i64,
    timestamp: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    timeframe_type: String,
    timeframe_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResponse {
    insight: Option<Insight>,
    stale: bool,
    entry_count: usize,
}

/// GET /api/accomplishments
async fn list_accomplishments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<Entry>> {
    let owner = state.owner(&headers);
    Ok(Json(state.store.list_entries(&owner).await?))
}

/// POST /api/accomplishments
async fn create_accomplishment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<NewAccomplishment>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<Entry>), ApiError> {
    let Json(body) = body?;
    let owner = state.owner(&headers);
    let entry = NewEntry::new(&body.text, body.rating, body.timestamp)?;
    let saved = state.store.add_entry(&owner, entry).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/timeframes/{type}
async fn list_timeframes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(timeframe_type): Path<String>,
) -> ApiResult<Vec<TimeframeSummary>> {
    let granularity: Granularity = timeframe_type.parse()?;
    let owner = state.owner(&headers);
    let entries = state.store.list_entries(&owner).await?;
    Ok(Json(aggregate::timeframes(&entries, granularity)))
}

/// GET /api/insights/{type}/{key}
async fn get_insight(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((timeframe_type, timeframe_key)): Path<(String, String)>,
) -> ApiResult<InsightResponse> {
    let granularity: Granularity = timeframe_type.parse()?;
    let key = parse_bucket_key(&timeframe_key, granularity)?;
    let owner = state.owner(&headers);

    let entries = state.store.list_entries(&owner).await?;
    let current = entry_ids(&aggregate::bucket_entries(&entries, &key, granularity));
    let insight = InsightCache::new(Arc::clone(&state.store), owner)
        .lookup(granularity, &key)
        .await?;

    Ok(Json(InsightResponse {
        stale: insight.as_ref().is_some_and(|i| is_stale(i, &current)),
        entry_count: current.len(),
        insight,
    }))
}

/// POST /api/insights
async fn generate_insight(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<InsightResponse> {
    let Json(body) = body?;
    let granularity: Granularity = body.timeframe_type.parse()?;
    let key = parse_bucket_key(&body.timeframe_key, granularity)?;
    let owner = state.owner(&headers);

    let _slot = state.claim(&owner, &Insight::composite_id(granularity, &key))?;

    let entries = state.store.list_entries(&owner).await?;
    let view = BucketView {
        granularity,
        entries: aggregate::bucket_entries(&entries, &key, granularity),
        key,
    };
    let entry_count = view.entries.len();

    let mut orchestrator = InsightOrchestrator::new(
        InsightCache::new(Arc::clone(&state.store), owner),
        Arc::clone(&state.generator),
        state.max_prompt_entries,
    );
    orchestrator.select(Some(view)).await;
    let insight = orchestrator.generate().await?;

    Ok(Json(InsightResponse {
        insight: Some(insight),
        stale: false,
        entry_count,
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/accomplishments",
            get(list_accomplishments).post(create_accomplishment),
        )
        .route("/api/timeframes/{timeframe_type}", get(list_timeframes))
        .route(
            "/api/insights/{timeframe_type}/{timeframe_key}",
            get(get_insight),
        )
        .route("/api/insights", post(generate_insight))
        .with_state(state)
}

/// Open the database, build the generator, and serve until ctrl-c.
pub async fn serve(config: AccomplishConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let generator: Arc<dyn TextGenerator> = Arc::from(create_generator(&config.generation)?);
    if generator.is_configured() {
        tracing::info!(generator = generator.id(), "insight generation ready");
    } else {
        tracing::warn!("insight generation not configured; POST /api/insights will return 503");
    }

    let state = AppState::new(
        Arc::new(SqliteStore::new(conn)),
        generator,
        config.storage.owner.clone(),
        config.generation.max_entries,
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}/api");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
