use serde::Deserialize;
use serde_json::{Map, Value};

use concierge_core::{ChatMessage, Error, Role};
use concierge_rpc::{RpcClient, ToolDefinition};

use crate::app_state::AppState;
use crate::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You are a travel assistant for a hotel booking service. \
Use the available tools to look up live data (hotels, offers, currencies, bookings) \
before answering. Answer in the language of the user's message.";

/// Ceiling on completion passes per request. The last permitted pass
/// advertises no tools, so the model has to answer in text.
const MAX_COMPLETION_PASSES: usize = 4;

/// A prior conversation turn supplied by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

/// The final outcome of one chat request.
pub struct ChatOutcome {
    pub reply: String,
    pub raw: Value,
}

/// Run the bounded tool-calling loop between the chat provider and the
/// tool router.
///
/// # Errors
/// Returns `Error::Provider` when a completion call fails. A failing
/// router is not an error: the catalog fetch degrades to an empty tool
/// set, and individual tool-call failures are fed back to the model as
/// error text.
pub async fn run(
    state: &AppState,
    message: &str,
    history: &[HistoryMessage],
) -> Result<ChatOutcome, Error> {
    let rpc = RpcClient::new(state.http.clone(), state.config.router_url.clone());

    let tools = match rpc.list_tools().await {
        Ok(tools) => tools,
        Err(e) => {
            tracing::warn!("tool catalog unavailable, continuing without tools: {e}");
            Vec::new()
        }
    };
    let tool_schemas: Vec<Value> = tools.iter().map(function_schema).collect();

    let llm = LlmClient::new(state.http.clone(), &state.config);

    let mut transcript = vec![ChatMessage::system(SYSTEM_PROMPT)];
    for turn in history {
        transcript.push(ChatMessage::text(turn.role, turn.content.clone()));
    }
    transcript.push(ChatMessage::user(message));

    let mut last_raw = Value::Null;
    let mut last_text = String::new();

    for pass in 0..MAX_COMPLETION_PASSES {
        let advertise = pass + 1 < MAX_COMPLETION_PASSES && !tool_schemas.is_empty();
        let raw = llm
            .complete(&transcript, advertise.then_some(tool_schemas.as_slice()))
            .await?;

        let assistant: ChatMessage =
            serde_json::from_value(raw["choices"][0]["message"].clone())
                .map_err(|e| Error::Provider(format!("malformed completion message: {e}")))?;
        last_raw = raw;

        if let Some(content) = assistant.content.as_deref() {
            if !content.is_empty() {
                last_text = content.to_string();
            }
        }

        let calls = assistant.tool_calls.clone().unwrap_or_default();
        transcript.push(assistant);

        if calls.is_empty() || !advertise {
            return Ok(ChatOutcome {
                reply: last_text,
                raw: last_raw,
            });
        }

        // Sequential on purpose: message order in the transcript must match
        // the order the model issued the calls in.
        for call in calls {
            let arguments: Value = serde_json::from_str(&call.function.arguments)
                .unwrap_or_else(|_| Value::Object(Map::new()));

            let text = match rpc.call_tool(&call.function.name, arguments).await {
                Ok(result) => render_tool_result(&result),
                Err(e) => {
                    tracing::warn!("tool call '{}' failed: {e}", call.function.name);
                    format!("Tool call failed: {e}")
                }
            };

            transcript.push(ChatMessage::tool(call.id, call.function.name, text));
        }
    }

    Ok(ChatOutcome {
        reply: last_text,
        raw: last_raw,
    })
}

/// Reduce a raw tool result to the text fed back to the model:
/// `structuredContent` if present, else the first content block, else the
/// whole result.
fn render_tool_result(result: &Value) -> String {
    if let Some(structured) = result.get("structuredContent") {
        return structured.to_string();
    }
    if let Some(text) = result
        .get("content")
        .and_then(|c| c.get(0))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
    {
        return text.to_string();
    }
    result.to_string()
}

/// Translate a router tool definition into the provider's
/// function-calling shape. The `headers` property is stripped: the model
/// is never invited to author outbound headers.
fn function_schema(def: &ToolDefinition) -> Value {
    let mut parameters = def.input_schema.clone();
    if let Some(props) = parameters
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    {
        props.remove("headers");
    }
    if let Some(required) = parameters.get_mut("required").and_then(Value::as_array_mut) {
        required.retain(|v| v != "headers");
    }

    serde_json::json!({
        "type": "function",
        "function": {
            "name": def.name,
            "description": def.description,
            "parameters": parameters,
        }
    })
}
