//! RPC 通信模块
//!
//! 实现 JSON-RPC 2.0 协议的服务器端：WebSocket 和 stdin/stdout 两种传输共用同一套方法。

pub mod methods;
pub mod server;
pub mod types;
pub mod ws;

pub use methods::RpcMethods;
pub use server::{serve_connection, NotificationSender, RpcServer};
pub use types::*;
pub use ws::{build_router, AppState, WsServer};
