use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    /// Create an error response carrying detail in `error.data`.
    #[must_use]
    pub fn error_with_data(
        id: Value,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC error codes.
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// Parse a raw request body into JSON, stripping a leading UTF-8 BOM.
///
/// # Errors
/// Returns the underlying parse error for malformed JSON; the caller maps
/// it to a `-32700` envelope.
pub fn decode_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    serde_json::from_slice(bytes)
}

/// Normalize `tools/call` params into `(name, arguments)`.
///
/// Precedence for the argument object: `params.arguments`, then
/// `params.args`, then the remaining params with `name` removed. Applied
/// once at the RPC boundary so handlers always see one canonical shape.
#[must_use]
pub fn call_params(params: Option<&Value>) -> (Option<String>, Value) {
    let Some(params) = params else {
        return (None, Value::Object(Map::new()));
    };

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let arguments = if let Some(args) = params.get("arguments") {
        args.clone()
    } else if let Some(args) = params.get("args") {
        args.clone()
    } else if let Some(map) = params.as_object() {
        let mut rest = map.clone();
        rest.remove("name");
        Value::Object(rest)
    } else {
        Value::Object(Map::new())
    };

    (name, arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/list",
            "params": null
        }"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.id, serde_json::json!(1));
    }

    #[test]
    fn success_response() {
        let resp = JsonRpcResponse::success(serde_json::json!(1), serde_json::json!({"tools": []}));
        assert!(resp.error.is_none());
        assert!(resp.result.is_some());

        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("error"));
    }

    #[test]
    fn error_response() {
        let resp = JsonRpcResponse::error(serde_json::json!(1), METHOD_NOT_FOUND, "Method not found");
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());

        let err = resp.error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.message, "Method not found");
    }

    #[test]
    fn error_data_is_carried() {
        let resp = JsonRpcResponse::error_with_data(
            Value::Null,
            INTERNAL_ERROR,
            "Tool execution error",
            Some(serde_json::json!("connection refused")),
        );
        assert_eq!(resp.error.unwrap().data.unwrap(), "connection refused");
    }

    #[test]
    fn decode_strips_bom() {
        let mut body = b"\xef\xbb\xbf".to_vec();
        body.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
        let value = decode_body(&body).unwrap();
        assert_eq!(value["method"], "tools/list");
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(decode_body(b"{not json").is_err());
    }

    #[test]
    fn call_params_prefers_arguments() {
        let params = serde_json::json!({
            "name": "ping",
            "arguments": {"a": 1},
            "args": {"b": 2}
        });
        let (name, args) = call_params(Some(&params));
        assert_eq!(name.as_deref(), Some("ping"));
        assert_eq!(args, serde_json::json!({"a": 1}));
    }

    #[test]
    fn call_params_falls_back_to_args() {
        let params = serde_json::json!({"name": "ping", "args": {"b": 2}});
        let (_, args) = call_params(Some(&params));
        assert_eq!(args, serde_json::json!({"b": 2}));
    }

    #[test]
    fn call_params_uses_remaining_params() {
        let params = serde_json::json!({"name": "ping", "query": {"locale": "en_DE"}});
        let (name, args) = call_params(Some(&params));
        assert_eq!(name.as_deref(), Some("ping"));
        assert_eq!(args, serde_json::json!({"query": {"locale": "en_DE"}}));
    }

    #[test]
    fn call_params_without_params() {
        let (name, args) = call_params(None);
        assert!(name.is_none());
        assert_eq!(args, serde_json::json!({}));
    }
}
