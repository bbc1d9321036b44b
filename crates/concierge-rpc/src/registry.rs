use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use concierge_core::{Error, ToolResult};

use crate::jsonrpc::{
    self, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND,
};

/// Definition of a tool exposed through `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
    #[serde(rename = "outputSchema", default)]
    pub output_schema: Value,
}

/// Executes a single tool invocation.
///
/// An `Err` from `call` is a handler-level failure that escapes the tool
/// (a scheduling or registry bug) and becomes a `-32603` RPC error. Tool
/// handlers that catch their own upstream failures return
/// `Ok(ToolResult::error(..))` instead.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Value) -> Result<ToolResult, Error>;
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// The canonical mapping from tool name to definition and handler.
///
/// Rebuilt fresh per request by the catalog factory; `tools/list` order is
/// registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A duplicate name overwrites the earlier
    /// registration in place, keeping its position in listing order.
    ///
    /// # Errors
    /// Returns `Error::InvalidParams` when the name is empty.
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), Error> {
        if definition.name.trim().is_empty() {
            return Err(Error::InvalidParams(
                "tool name must be a non-empty string".to_string(),
            ));
        }

        let entry = RegisteredTool {
            definition,
            handler,
        };
        if let Some(existing) = self
            .tools
            .iter_mut()
            .find(|t| t.definition.name == entry.definition.name)
        {
            *existing = entry;
        } else {
            self.tools.push(entry);
        }
        Ok(())
    }

    /// Tool definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| &t.definition).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute one JSON-RPC request against the registry.
    pub async fn dispatch(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        match req.method.as_str() {
            "tools/list" => self.handle_list(req),
            "tools/call" => self.handle_call(req).await,
            other => JsonRpcResponse::error(
                req.id.clone(),
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        }
    }

    fn handle_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            req.id.clone(),
            serde_json::json!({ "tools": self.definitions() }),
        )
    }

    async fn handle_call(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let (name, arguments) = jsonrpc::call_params(req.params.as_ref());

        let Some(name) = name else {
            return JsonRpcResponse::error(req.id.clone(), INVALID_PARAMS, "Missing tool name");
        };

        let Some(tool) = self.tools.iter().find(|t| t.definition.name == name) else {
            return JsonRpcResponse::error(
                req.id.clone(),
                METHOD_NOT_FOUND,
                format!("Tool not found: {name}"),
            );
        };

        match tool.handler.call(arguments).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(req.id.clone(), value),
                Err(e) => JsonRpcResponse::error_with_data(
                    req.id.clone(),
                    jsonrpc::INTERNAL_ERROR,
                    "Tool execution error",
                    Some(Value::String(e.to_string())),
                ),
            },
            Err(e) => {
                tracing::error!("tool '{name}' failed outside its handler: {e}");
                JsonRpcResponse::error_with_data(
                    req.id.clone(),
                    jsonrpc::INTERNAL_ERROR,
                    "Tool execution error",
                    Some(Value::String(e.to_string())),
                )
            }
        }
    }
}
