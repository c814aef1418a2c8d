use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use loft_types::api::SearchParams;

use crate::AppState;
use crate::middleware::Claims;

const MAX_SEARCH_RESULTS: usize = 200;

/// Never fails with 403/404: out-of-scope filters come back as an empty
/// list from the store.
pub async fn search_messages(
    State(state): State<AppState>,
    Query(mut params): Query<SearchParams>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    params.limit = Some(params.limit.unwrap_or(MAX_SEARCH_RESULTS).min(MAX_SEARCH_RESULTS));

    let messages = state
        .store
        .search_messages(claims.sub, &params)
        .map_err(|e| {
            error!("store error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(messages))
}
