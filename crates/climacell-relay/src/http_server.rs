//! HTTP surface binding fetch, publish, and archive together.
//!
//! Fetch endpoints relay the raw upstream JSON to the caller while the
//! normalized payload goes out on the message topic. Store endpoints serve
//! the archived snapshots back, normalized and tagged with their blob
//! names.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

use crate::archive::{Archiver, RangeQuery};
use crate::error::{RelayError, Result};
use crate::fetch::{ForecastKind, ForecastSource};
use crate::publish::Publisher;
use crate::tz;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn ForecastSource>,
    pub publisher: Arc<dyn Publisher>,
    pub archiver: Arc<Archiver>,
    pub source_tz: Tz,
    pub target_tz: Tz,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Upstream statuses pass through unchanged.
            RelayError::UpstreamStatus(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::NameNotFound(_) => StatusCode::NOT_FOUND,
            RelayError::InvalidEnvelope(_) => StatusCode::BAD_REQUEST,
            RelayError::PublishTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Query params for `GET /store/{kind}/`.
#[derive(Deserialize)]
struct StoreQuery {
    last: Option<usize>,
    start: Option<String>,
    end: Option<String>,
}

/// Push-delivery envelope for `POST /store/{kind}/`.
#[derive(Deserialize)]
struct PushEnvelope {
    message: PushMessage,
}

#[derive(Deserialize)]
struct PushMessage {
    data: String,
}

fn parse_kind(kind: &str) -> std::result::Result<ForecastKind, Response> {
    ForecastKind::parse(kind)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown forecast kind '{kind}'")).into_response())
}

/// Fetch, publish the normalized payload, return the raw one.
///
/// Publish failures and timeouts are reported through the log and do not
/// fail the response; the caller always sees the upstream JSON.
async fn fetch_and_publish(state: AppState, kind: ForecastKind) -> Result<Json<Value>> {
    let raw = state.fetcher.fetch(kind).await?;

    let normalized = tz::normalize(raw.clone(), state.source_tz, state.target_tz);
    if let Err(e) = state.publisher.publish(&normalized, kind.as_str()).await {
        log::error!("Publish of {kind} payload failed: {e}");
    }

    Ok(Json(raw))
}

/// GET /realtime/ - fetch + publish current conditions
async fn realtime(State(state): State<AppState>) -> Result<Json<Value>> {
    fetch_and_publish(state, ForecastKind::Realtime).await
}

/// GET /hourly/ - fetch + publish the hourly forecast
async fn hourly(State(state): State<AppState>) -> Result<Json<Value>> {
    fetch_and_publish(state, ForecastKind::Hourly).await
}

/// GET /store/{kind}/ - normalized records for a range query
async fn read_store(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<StoreQuery>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let query = match (params.start, params.end) {
        (Some(start), Some(end)) => RangeQuery::Between { start, end },
        (None, None) => RangeQuery::LastN(params.last.unwrap_or(1)),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                "start and end must be supplied together",
            )
                .into_response()
        }
    };

    match state.archiver.materialize(kind, query).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /store/list/{kind}/ - all stored blobs of a category
async fn list_store(State(state): State<AppState>, Path(kind): Path<String>) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state.archiver.list(kind).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /store/{kind}/ - archive a push-delivered payload
async fn archive_push(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: Bytes,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let payload = match decode_envelope(&body) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };

    match state.archiver.store_snapshot(kind, &payload).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Decode a `{"message": {"data": base64}}` push envelope to the payload
/// text it carries.
fn decode_envelope(body: &[u8]) -> Result<String> {
    let envelope: PushEnvelope = serde_json::from_slice(body)
        .map_err(|e| RelayError::InvalidEnvelope(format!("bad envelope shape: {e}")))?;
    let decoded = STANDARD
        .decode(envelope.message.data.as_bytes())
        .map_err(|e| RelayError::InvalidEnvelope(format!("bad base64 payload: {e}")))?;
    String::from_utf8(decoded)
        .map_err(|_| RelayError::InvalidEnvelope("payload is not UTF-8".to_string()))
}

/// GET /health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Create the HTTP router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/realtime/", get(realtime))
        .route("/hourly/", get(hourly))
        .route("/store/{kind}/", get(read_store).post(archive_push))
        .route("/store/list/{kind}/", get(list_store))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until the shutdown channel fires.
pub async fn run_http_server(
    state: AppState,
    port: u16,
    mut shutdown: watch::Receiver<()>,
) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    log::info!("HTTP server listening on port {port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;

    Ok(())
}
