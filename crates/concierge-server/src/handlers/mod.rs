mod chat;
mod health;
mod rpc;

pub use chat::chat;
pub use health::health;
pub use rpc::rpc;
