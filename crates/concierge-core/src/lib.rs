pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use types::{ChatMessage, ContentBlock, FunctionCall, Role, ToolCall, ToolResult};
