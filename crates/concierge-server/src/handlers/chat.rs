use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::orchestrator::{self, HistoryMessage};

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    history: Vec<HistoryMessage>,
}

/// Chat endpoint: one user message in, one assistant reply out, with the
/// tool-calling loop in between.
pub async fn chat(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {e}"));
        }
    };

    let Some(message) = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "message is required");
    };

    match orchestrator::run(&state, message, &request.history).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "reply": outcome.reply,
                "raw": outcome.raw,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("chat request failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({"error": message.into()})),
    )
        .into_response()
}
