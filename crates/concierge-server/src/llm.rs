use serde_json::Value;

use concierge_core::{ChatMessage, Config, Error};

/// Client for an OpenAI-compatible chat-completion API.
pub struct LlmClient {
    client: reqwest::Client,
    base: String,
    key: Option<String>,
    model: String,
}

impl LlmClient {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base: config.llm_api_base.trim_end_matches('/').to_string(),
            key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
        }
    }

    /// Request one completion for the transcript. When `tools` is given,
    /// the provider may answer with tool calls; tool choice is left to the
    /// model.
    ///
    /// # Errors
    /// Returns `Error::Provider` on transport failure, a non-2xx status or
    /// an unparseable response.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
    ) -> Result<Value, Error> {
        let mut payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(tools) = tools {
            if !tools.is_empty() {
                payload["tools"] = Value::Array(tools.to_vec());
                payload["tool_choice"] = Value::String("auto".to_string());
            }
        }

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base))
            .json(&payload);
        if let Some(key) = &self.key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("invalid completion response: {e}")))?;

        if !status.is_success() {
            return Err(Error::Provider(format!(
                "chat provider returned HTTP {status}: {body}"
            )));
        }

        Ok(body)
    }
}
