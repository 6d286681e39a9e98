//! API routes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;

use crate::conversation::{ChatSummary, Conversation};
use crate::core::{ChatError, GenerateRequest, GenerateResponse};
use crate::providers::GenerationError;
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct StorageProbe {
    exists: bool,
    files: Vec<String>,
}

/// Error returned to HTTP clients as `{ "error": message }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn bad_request(message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn not_found(message: &'static str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    /// Log the underlying failure and hide it behind `message`
    fn internal(message: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", message, err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.config.provider.clone(),
    })
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected generate body: {}", rejection);
        ApiError::bad_request("Prompt is required")
    })?;

    let response = state
        .chat_engine
        .generate(request)
        .await
        .map_err(|e| match e {
            ChatError::EmptyPrompt => ApiError::bad_request("Prompt is required"),
            ChatError::Generation(GenerationError::NoCandidates) => {
                ApiError::internal("No response from Gemini API", e)
            }
            other => ApiError::internal("Failed to call Gemini API", other),
        })?;

    Ok(Json(response))
}

async fn list_chats(State(state): State<AppState>) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    let chats = state
        .chat_engine
        .list_conversations()
        .await
        .map_err(|e| ApiError::internal("Failed to read chat files", e))?;

    Ok(Json(chats))
}

async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state
        .chat_engine
        .get_conversation(&id)
        .await
        .map_err(|e| match e {
            ChatError::NotFound(_) => ApiError::not_found("Chat not found"),
            other => ApiError::internal("Failed to read chat file", other),
        })?;

    Ok(Json(conversation))
}

async fn clear_chats(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state
        .chat_engine
        .clear_all()
        .await
        .map_err(|e| ApiError::internal("Failed to clear chats", e))?;

    let message = match removed {
        None => "No chats to delete",
        Some(_) => "All chats cleared",
    };
    Ok(Json(MessageResponse { message }))
}

async fn storage_probe(State(state): State<AppState>) -> Response {
    match state.chat_engine.store().file_names().await {
        Ok(names) => Json(StorageProbe {
            exists: names.is_some(),
            files: names.unwrap_or_default(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Storage probe failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/chats", get(list_chats).delete(clear_chats))
        .route("/api/chats/:id", get(get_chat))
        .route("/api/test-files", get(storage_probe))
}
