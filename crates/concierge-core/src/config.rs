use std::time::Duration;

use crate::error::Error;

/// Runtime configuration, read once at process start and passed by
/// reference into the registry factory and the orchestrator. Handlers never
/// consult the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote hotel-booking REST API.
    pub booking_api_base: String,
    /// Optional bearer token attached to booking API requests.
    pub booking_api_token: Option<String>,
    /// Timeout applied to every outbound HTTP call.
    pub request_timeout: Duration,
    /// Base URL of the OpenAI-compatible chat-completion provider.
    pub llm_api_base: String,
    /// API key for the chat-completion provider.
    pub llm_api_key: Option<String>,
    /// Model name sent with every completion request.
    pub llm_model: String,
    /// URL of the JSON-RPC tool router the chat endpoint talks to.
    pub router_url: String,
    /// Bind host for the HTTP server.
    pub host: String,
    /// Bind port for the HTTP server.
    pub port: u16,
}

impl Config {
    /// Build the configuration from process environment variables.
    ///
    /// # Errors
    /// Returns `Error::Config` when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("REQUEST_TIMEOUT_SECS: {e}")))?,
            None => 30,
        };

        let port = match get("CONCIERGE_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("CONCIERGE_PORT: {e}")))?,
            None => 3000,
        };

        Ok(Self {
            booking_api_base: get("BOOKING_API_BASE")
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            booking_api_token: get("BOOKING_API_TOKEN"),
            request_timeout: Duration::from_secs(timeout_secs),
            llm_api_base: get("LLM_API_BASE")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            llm_api_key: get("LLM_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            router_url: get("ROUTER_URL")
                .unwrap_or_else(|| "http://localhost:3000/mcp".to_string()),
            host: get("CONCIERGE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }
}
