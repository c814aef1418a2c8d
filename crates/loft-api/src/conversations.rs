use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use loft_types::api::{ConversationPatch, NewConversation};

use crate::AppState;
use crate::middleware::Claims;

fn internal(e: anyhow::Error) -> StatusCode {
    error!("store error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewConversation>,
) -> Result<impl IntoResponse, StatusCode> {
    let conversation = state
        .store
        .create_conversation(claims.sub, req)
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let conversations = state
        .store
        .list_conversations(claims.sub)
        .map_err(internal)?;
    Ok(Json(conversations))
}

/// Not-found and not-owned both answer 404, so conversation ids cannot be
/// enumerated across users.
pub async fn update_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<ConversationPatch>,
) -> Result<impl IntoResponse, StatusCode> {
    let conversation = state
        .store
        .update_conversation(id, claims.sub, patch)
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(conversation))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    if state
        .store
        .delete_conversation(id, claims.sub)
        .map_err(internal)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
