use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use concierge_rpc::catalog;
use concierge_rpc::jsonrpc::{
    INTERNAL_ERROR, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
use concierge_rpc::{JsonRpcRequest, JsonRpcResponse, ToolRegistry};

use crate::app_state::AppState;

/// JSON-RPC endpoint for the tool router.
///
/// Every branch answers with a JSON body; RPC-level errors ride on HTTP
/// 200 and only transport-level failures use 4xx/5xx.
pub async fn rpc(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    match method {
        Method::POST => handle_post(&state, &body).await,
        Method::OPTIONS | Method::HEAD => preflight(),
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(JsonRpcResponse::error(
                Value::Null,
                METHOD_NOT_FOUND,
                "Method not allowed",
            )),
        )
            .into_response(),
    }
}

/// 204 advertising the accepted methods and headers. The CORS layer adds
/// the allow-origin header.
fn preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, HEAD, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, Mcp-Session-Id"),
    );
    response
}

async fn handle_post(state: &AppState, body: &[u8]) -> Response {
    let payload = match concierge_rpc::jsonrpc::decode_body(body) {
        Ok(value) => value,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error_with_data(
                    Value::Null,
                    PARSE_ERROR,
                    "Parse error",
                    Some(Value::String(e.to_string())),
                )),
            )
                .into_response();
        }
    };

    // Fresh registry per request; a failure here is a registry bug, not a
    // tool failure, and maps to a transport-level 500.
    let registry = match catalog::build_registry(&state.config, &state.http) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("failed to build tool registry: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(JsonRpcResponse::error_with_data(
                    Value::Null,
                    INTERNAL_ERROR,
                    "Internal error",
                    Some(Value::String(e.to_string())),
                )),
            )
                .into_response();
        }
    };

    match payload {
        Value::Array(items) => {
            // Element-wise: each invalid element produces its own error
            // object at the same position.
            let mut responses = Vec::with_capacity(items.len());
            for item in items {
                responses.push(process_one(&registry, item).await);
            }
            Json(responses).into_response()
        }
        single => {
            let response = process_one(&registry, single).await;
            let status = match &response.error {
                Some(error) if error.code == INVALID_REQUEST => StatusCode::BAD_REQUEST,
                _ => StatusCode::OK,
            };
            (status, Json(response)).into_response()
        }
    }
}

async fn process_one(registry: &ToolRegistry, value: Value) -> JsonRpcResponse {
    let id = value.get("id").cloned().unwrap_or(Value::Null);

    let Some(method) = value.get("method").and_then(Value::as_str) else {
        return JsonRpcResponse::error(id, INVALID_REQUEST, "Invalid Request");
    };

    let request = JsonRpcRequest {
        jsonrpc: value
            .get("jsonrpc")
            .and_then(Value::as_str)
            .unwrap_or("2.0")
            .to_string(),
        id,
        method: method.to_string(),
        params: value.get("params").cloned(),
    };

    registry.dispatch(&request).await
}
