use attune_agent::AssistantSessions;
use attune_core::config::ProvidersConfig;
use attune_core::EventContext;
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::AppContext;

#[derive(Clone)]
struct GatewayState {
    sessions: Arc<AssistantSessions>,
}

#[derive(Deserialize)]
struct ChatRequest {
    user_id: String,
    message: String,
    #[serde(default)]
    context: Option<EventContext>,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    response: String,
    conversation_id: Option<String>,
}

#[derive(Deserialize)]
struct SetupRequest {
    user_id: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default = "default_true")]
    enable_calendar: bool,
    #[serde(default = "default_true")]
    enable_notes: bool,
}

fn default_true() -> bool {
    true
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "detail": e.to_string() })),
    )
        .into_response()
}

async fn handle_root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "attune",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn handle_chat(State(state): State<GatewayState>, Json(req): Json<ChatRequest>) -> Response {
    let handle = match state.sessions.get_or_create(&req.user_id, None).await {
        Ok(handle) => handle,
        Err(e) => return internal_error(e),
    };
    let mut assistant = handle.lock().await;
    match assistant.chat(&req.message, req.context.unwrap_or_default()) {
        Ok(response) => (
            StatusCode::OK,
            Json(ChatResponse {
                response,
                conversation_id: assistant.conversation_id().map(str::to_string),
            }),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn handle_setup(State(state): State<GatewayState>, Json(req): Json<SetupRequest>) -> Response {
    let providers = ProvidersConfig {
        calendar: req.enable_calendar,
        notes: req.enable_notes,
    };
    match state
        .sessions
        .setup(&req.user_id, req.user_name.as_deref(), &providers)
        .await
    {
        Ok(handle) => {
            let assistant = handle.lock().await;
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "success",
                    "message": format!("Assistant setup complete for {}", assistant.user_id()),
                    "integrations": assistant.registry().names(),
                })),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn handle_suggestions(State(state): State<GatewayState>, AxumPath(user_id): AxumPath<String>) -> Response {
    match state.sessions.get_or_create(&user_id, None).await {
        Ok(handle) => {
            let assistant = handle.lock().await;
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "user_id": assistant.user_id(),
                    "suggestions": assistant.get_suggestions(),
                })),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn handle_preferences(State(state): State<GatewayState>, AxumPath(user_id): AxumPath<String>) -> Response {
    match state.sessions.get_or_create(&user_id, None).await {
        Ok(handle) => {
            let assistant = handle.lock().await;
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "user_id": assistant.user_id(),
                    "preferences": assistant.get_preferences(),
                })),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn handle_health(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "active_users": state.sessions.len().await,
    }))
}

fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/chat", post(handle_chat))
        .route("/setup", post(handle_setup))
        .route("/user/:user_id/suggestions", get(handle_suggestions))
        .route("/user/:user_id/preferences", get(handle_preferences))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let ctx = AppContext::load()?;
    let host = host.unwrap_or_else(|| ctx.config.gateway.host.clone());
    let port = port.unwrap_or(ctx.config.gateway.port);

    let sessions = Arc::new(AssistantSessions::new(ctx.docs.clone(), ctx.config.clone()));
    let app = router(GatewayState { sessions });

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Gateway listening");
    println!("attune gateway listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
