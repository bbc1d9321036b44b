/// Core error type for the concierge system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("chat provider error: {0}")]
    Provider(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}
