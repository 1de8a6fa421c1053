//! 命令模块
//!
//! 命令解析、补全和分发。

pub mod complete;
pub mod dispatch;
pub mod outcome;
pub mod parse;

pub use complete::complete;
pub use dispatch::Dispatcher;
pub use outcome::{Outcome, StatusReport};
pub use parse::{Command, FilterExpr, COMMAND_NAMES};
