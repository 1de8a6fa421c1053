//! 工具模块
//!
//! 提供错误类型和会话生命周期管理。

pub mod error;
pub mod state;

pub use error::{ProviderError, ShellError};
pub use state::{LifecycleManager, StateTransitionResult};
