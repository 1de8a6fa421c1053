//! JobShell 库
//!
//! 浏览器终端风格的职位浏览服务：命令解析与分发、会话状态、输出格式化、
//! 职位数据源以及 JSON-RPC 传输。

pub mod command;
pub mod config;
pub mod jobs;
pub mod output;
pub mod rpc;
pub mod session;
pub mod utils;
