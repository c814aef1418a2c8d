use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use loft_store::analytics::EventFilter;
use loft_types::api::{AnalyticsQuery, IngestRequest, IngestResponse, PurgeResponse};

use crate::AppState;
use crate::middleware::Claims;

fn internal(e: anyhow::Error) -> StatusCode {
    error!("store error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Batch ingestion. Shape validation happened upstream; duplicates are
/// skipped inside the store, so replaying a batch is safe.
pub async fn ingest_events(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<IngestRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let ingested = state.store.ingest_events(req.events).map_err(internal)?;
    Ok((StatusCode::ACCEPTED, Json(IngestResponse { ingested })))
}

/// The caller's own events only; `event_names` arrives comma-separated on
/// the query string.
pub async fn query_events(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let filter = EventFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        event_names: query
            .event_names
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        limit: query.limit,
    };

    let events = state
        .store
        .query_events(claims.sub, &filter)
        .map_err(internal)?;
    Ok(Json(events))
}

/// Data-erasure endpoint: drops every event stored for the caller.
pub async fn purge_events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let deleted = state.store.delete_user_events(claims.sub).map_err(internal)?;
    Ok(Json(PurgeResponse { deleted }))
}
