use std::sync::Arc;

use concierge_core::{Config, Error};

/// Shared application state: configuration plus one outbound HTTP client.
///
/// The tool registry is not part of the state. It is rebuilt per request
/// by the catalog factory so concurrent requests share no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build the state, applying the configured timeout to every outbound
    /// call (booking API, router, chat provider).
    ///
    /// # Errors
    /// Returns `Error::Config` if the HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }
}
