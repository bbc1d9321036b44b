pub mod catalog;
pub mod client;
pub mod jsonrpc;
pub mod registry;

pub use client::RpcClient;
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use registry::{ToolDefinition, ToolHandler, ToolRegistry};
