//! HTTP request surface.
//!
//! Thin handlers over the shared [`AppContext`]. Every failure is returned as
//! `{"error": <generic message>, "kind": <error kind>}`.

mod error;

pub use error::ApiError;

use crate::config::ServerSettings;
use crate::context::AppContext;
use crate::error::{ErrorKind, PokeError};
use crate::integration::ConnectionStatus;
use crate::store::{MessageResponse, Turn, User, UserMemory};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Build the application router.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(&ctx.settings.server);

    Router::new()
        .route("/health", get(health))
        .route("/users", post(create_user))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/memory", get(get_memory))
        .route("/users/{user_id}/conversations", get(get_conversations))
        .route("/connections/initiate", post(initiate_connection))
        .route("/connections/{connection_id}/status", get(connection_status))
        .route("/messages", post(submit_message))
        .route("/messages/{message_id}/response", get(message_response))
        .layer(cors)
        .with_state(ctx)
}

fn cors_layer(settings: &ServerSettings) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if settings.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct CreateUserRequest {
    #[serde(default, alias = "connection_id")]
    user_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateUserResponse {
    user_id: String,
}

#[derive(Serialize)]
struct ConversationsResponse {
    conversations: Vec<Turn>,
}

#[derive(Deserialize)]
struct InitiateConnectionRequest {
    user_id: String,
    #[serde(default)]
    auth_config_id: Option<String>,
}

#[derive(Serialize)]
struct InitiateConnectionResponse {
    connection_id: String,
    redirect_url: Option<String>,
}

#[derive(Serialize)]
struct ConnectionStatusResponse {
    status: ConnectionStatus,
    connection_id: String,
}

#[derive(Deserialize)]
struct SubmitMessageRequest {
    user_id: String,
    content: String,
}

#[derive(Serialize)]
struct SubmitMessageResponse {
    message_id: String,
    status: &'static str,
}

// === Handlers ===

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn create_user(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<CreateUserResponse> {
    let Json(req) = payload?;
    let user = ctx.records.create_user(req.user_id.as_deref(), req.name);
    info!("Created user {}", user.user_id);
    Ok(Json(CreateUserResponse {
        user_id: user.user_id,
    }))
}

async fn get_user(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
) -> ApiResult<User> {
    ctx.records
        .get_user(&user_id)
        .map(Json)
        .ok_or_else(|| PokeError::UserNotFound(user_id).into())
}

async fn get_memory(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
) -> ApiResult<UserMemory> {
    Ok(Json(ctx.records.memory(&user_id)))
}

async fn get_conversations(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
) -> ApiResult<ConversationsResponse> {
    Ok(Json(ConversationsResponse {
        conversations: ctx.records.memory(&user_id).conversation_history,
    }))
}

async fn initiate_connection(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<InitiateConnectionRequest>, JsonRejection>,
) -> ApiResult<InitiateConnectionResponse> {
    let Json(req) = payload?;
    let request = ctx
        .integrations
        .initiate_connection(&req.user_id, req.auth_config_id.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, kind = %e.kind(), "Connection initiation failed");
            ApiError::new(ErrorKind::Internal)
        })?;
    info!(
        "Initiated connection {} for {}",
        request.connection_id, req.user_id
    );
    Ok(Json(InitiateConnectionResponse {
        connection_id: request.connection_id,
        redirect_url: request.redirect_url,
    }))
}

async fn connection_status(
    State(ctx): State<Arc<AppContext>>,
    Path(connection_id): Path<String>,
) -> ApiResult<ConnectionStatusResponse> {
    let status = ctx.integrations.connection_status(&connection_id).await?;
    Ok(Json(ConnectionStatusResponse {
        status,
        connection_id,
    }))
}

async fn submit_message(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<SubmitMessageRequest>, JsonRejection>,
) -> ApiResult<SubmitMessageResponse> {
    let Json(req) = payload?;
    if req.content.trim().is_empty() {
        return Err(PokeError::InvalidInput("message content is empty".to_string()).into());
    }

    let message_id = ctx.queue.enqueue(&req.user_id, &req.content)?;
    Ok(Json(SubmitMessageResponse {
        message_id,
        status: "queued",
    }))
}

async fn message_response(
    State(ctx): State<Arc<AppContext>>,
    Path(message_id): Path<String>,
) -> ApiResult<MessageResponse> {
    ctx.responses
        .get(&message_id)
        .map(Json)
        .ok_or_else(|| PokeError::MessageNotFound(message_id).into())
}
