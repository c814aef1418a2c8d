use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use loft_api::middleware::require_auth;
use loft_api::{AppState, AppStateInner, analytics, conversations, messages, search};
use loft_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loft=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("LOFT_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let host = std::env::var("LOFT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("LOFT_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Shared state — the store lives for the process lifetime.
    let state: AppState = Arc::new(AppStateInner {
        store: Store::new(),
        jwt_secret,
    });

    // Routes — everything requires a bearer token; token issuance is
    // handled by the identity service in front of this one.
    let app = Router::new()
        .route("/conversations", post(conversations::create_conversation))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/{id}", patch(conversations::update_conversation))
        .route("/conversations/{id}", delete(conversations::delete_conversation))
        .route("/conversations/{id}/messages", post(messages::send_message))
        .route("/conversations/{id}/messages", get(messages::get_messages))
        .route("/messages/{id}", patch(messages::update_message))
        .route("/messages/{id}", delete(messages::delete_message))
        .route("/search/messages", get(search::search_messages))
        .route("/analytics/events", post(analytics::ingest_events))
        .route("/analytics/events", get(analytics::query_events))
        .route("/analytics/events", delete(analytics::purge_events))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Loft server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
