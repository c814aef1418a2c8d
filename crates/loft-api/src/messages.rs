use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use loft_types::api::{MessagePatch, NewMessage};

use crate::AppState;
use crate::middleware::Claims;

fn internal(e: anyhow::Error) -> StatusCode {
    error!("store error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(mut req): Json<NewMessage>,
) -> Result<impl IntoResponse, StatusCode> {
    // The store creates unconditionally; existence and ownership are this
    // layer's job.
    state
        .store
        .get_conversation(conversation_id, claims.sub)
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if req.sender_name.is_empty() {
        req.sender_name = claims.username.clone();
    }

    let message = state
        .store
        .create_message(conversation_id, claims.sub, req)
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let messages = state
        .store
        .list_messages(conversation_id, claims.sub)
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(messages))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<MessagePatch>,
) -> Result<impl IntoResponse, StatusCode> {
    let message = state
        .store
        .update_message(id, claims.sub, patch)
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    if state.store.delete_message(id, claims.sub).map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
