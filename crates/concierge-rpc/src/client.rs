use serde_json::Value;

use concierge_core::Error;

use crate::registry::ToolDefinition;

/// Minimal JSON-RPC client for talking to a tool router over HTTP POST.
/// Used by the chat orchestrator and the CLI.
#[derive(Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: String,
}

impl RpcClient {
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch the tool catalog via `tools/list`.
    ///
    /// # Errors
    /// Returns `Error::Upstream` on transport failure or an RPC error.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, Error> {
        let result = self.request("tools/list", Value::Null).await?;
        let tools = result.get("tools").cloned().unwrap_or(Value::Array(vec![]));
        serde_json::from_value(tools)
            .map_err(|e| Error::Upstream(format!("malformed tools/list response: {e}")))
    }

    /// Invoke a tool via `tools/call` and return the raw result value
    /// (the `ToolResult` as JSON).
    ///
    /// # Errors
    /// Returns `Error::Upstream` on transport failure or an RPC error.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, Error> {
        self.request(
            "tools/call",
            serde_json::json!({"name": name, "arguments": arguments}),
        )
        .await
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, Error> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("router request failed: {e}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("router returned invalid JSON: {e}")))?;

        if let Some(error) = body.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::Upstream(format!("RPC error {code}: {message}")));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}
