//! 错误类型定义
//!
//! 定义 JobShell 的错误类型，提供描述性错误消息。
//!
//! ## 功能
//! - 命令级错误：参数校验、索引越界、职位数据源失败、存储失败
//! - 传输级错误：无效请求、序列化
//! - 提供错误分类和辅助方法
//! - 支持转换为 JSON-RPC 错误格式
//!
//! 命令级错误只会渲染为终端中的错误行，不会终止会话。

use thiserror::Error;

use crate::rpc::types::JsonRpcError;

/// 职位数据源错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// 数据源不可用（进程失败、超时、输出无法解析）
    #[error("Job provider unavailable: {0}")]
    Unavailable(String),

    /// 数据源不支持该类别
    #[error("Invalid job category: {0}")]
    InvalidCategory(String),
}

/// JobShell 错误类型
#[derive(Debug, Error)]
pub enum ShellError {
    /// 命令或参数无效，会话状态不变
    #[error("{0}")]
    Validation(String),

    /// 索引越界
    #[error("{0}")]
    NotFound(String),

    /// 职位数据源失败，保留之前的职位列表
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// 保存/加载失败，内存状态保持不变
    #[error("Storage error: {0}")]
    Storage(String),

    /// 无效的 RPC 请求
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ShellError> for JsonRpcError {
    fn from(err: ShellError) -> Self {
        // 使用应用特定的错误码范围 (-32000 到 -32099)
        let code = match &err {
            ShellError::NotFound(_) => -32001,
            ShellError::Validation(_) => -32010,
            ShellError::Provider(_) => -32020,
            ShellError::Storage(_) => -32030,
            ShellError::InvalidRequest(_) => -32602, // 使用标准的无效参数错误码
            ShellError::Serialization(_) => -32700,  // 使用标准的解析错误码
        };

        JsonRpcError {
            code,
            message: err.to_string(),
            data: Some(serde_json::json!({
                "error_type": err.error_type(),
                "error_code": err.code(),
                "recoverable": err.is_recoverable(),
            })),
        }
    }
}

impl ShellError {
    /// 获取错误码
    pub fn code(&self) -> i32 {
        match self {
            ShellError::Validation(_) => 2001,
            ShellError::NotFound(_) => 2002,
            ShellError::Provider(_) => 2003,
            ShellError::Storage(_) => 2004,
            ShellError::InvalidRequest(_) => 2005,
            ShellError::Serialization(_) => 2006,
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShellError::Validation(_) => "validation_error",
            ShellError::NotFound(_) => "not_found_error",
            ShellError::Provider(_) => "provider_error",
            ShellError::Storage(_) => "storage_error",
            ShellError::InvalidRequest(_) => "invalid_request",
            ShellError::Serialization(_) => "serialization_error",
        }
    }

    /// 重试同一命令是否可能成功
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShellError::Provider(ProviderError::Unavailable(_)) | ShellError::Storage(_)
        )
    }

    // ============ 构造辅助方法 ============

    pub fn validation(message: impl Into<String>) -> Self {
        ShellError::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        ShellError::Storage(message.into())
    }

    /// 创建用法错误
    pub fn usage(usage: &str) -> Self {
        ShellError::Validation(format!("Usage: {}", usage))
    }

    /// 创建未知命令错误
    pub fn unknown_command(line: &str) -> Self {
        ShellError::Validation(format!(
            "Unknown command: '{}'. Type 'help' to see available commands.",
            line
        ))
    }

    /// 创建索引越界错误
    ///
    /// `what` 为列表名称（如 "job"、"bookmark"），`hint` 为查看列表的命令。
    pub fn index_out_of_range(what: &str, index: usize, len: usize, hint: &str) -> Self {
        if len == 0 {
            ShellError::NotFound(format!(
                "Invalid {} ID {}: the list is empty. Use '{}' first.",
                what, index, hint
            ))
        } else {
            ShellError::NotFound(format!(
                "Invalid {} ID {}. Use '{}' to see available entries (1-{}).",
                what, index, hint, len
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShellError::storage("disk full");
        assert_eq!(err.to_string(), "Storage error: disk full");

        let err: ShellError = ProviderError::Unavailable("timed out".to_string()).into();
        assert_eq!(err.to_string(), "Job provider unavailable: timed out");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ShellError::validation("").code(), 2001);
        assert_eq!(ShellError::NotFound("".to_string()).code(), 2002);
        assert_eq!(
            ShellError::Provider(ProviderError::InvalidCategory("x".to_string())).code(),
            2003
        );
        assert_eq!(ShellError::storage("").code(), 2004);
    }

    #[test]
    fn test_error_types() {
        assert_eq!(ShellError::validation("").error_type(), "validation_error");
        assert_eq!(ShellError::NotFound("".to_string()).error_type(), "not_found_error");
        assert_eq!(
            ShellError::InvalidRequest("".to_string()).error_type(),
            "invalid_request"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ShellError::Provider(ProviderError::Unavailable("".to_string())).is_recoverable());
        assert!(ShellError::storage("").is_recoverable());
        assert!(!ShellError::validation("").is_recoverable());
        assert!(!ShellError::Provider(ProviderError::InvalidCategory("".to_string())).is_recoverable());
    }

    #[test]
    fn test_index_out_of_range_messages() {
        let err = ShellError::index_out_of_range("job", 9, 3, "list");
        assert!(matches!(err, ShellError::NotFound(_)));
        assert!(err.to_string().contains("(1-3)"));

        let err = ShellError::index_out_of_range("bookmark", 1, 0, "bookmark <id>");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_unknown_command_suggests_help() {
        let err = ShellError::unknown_command("frobnicate");
        assert!(err.to_string().contains("frobnicate"));
        assert!(err.to_string().contains("help"));
    }

    #[test]
    fn test_shell_error_to_json_rpc_error() {
        let rpc_err: JsonRpcError = ShellError::NotFound("gone".to_string()).into();
        assert_eq!(rpc_err.code, -32001);
        assert!(rpc_err.message.contains("gone"));

        let rpc_err: JsonRpcError = ShellError::InvalidRequest("bad params".to_string()).into();
        assert_eq!(rpc_err.code, -32602);

        let rpc_err: JsonRpcError =
            ShellError::Provider(ProviderError::Unavailable("down".to_string())).into();
        assert_eq!(rpc_err.code, -32020);

        let data = rpc_err.data.unwrap();
        assert_eq!(data["error_type"], "provider_error");
        assert_eq!(data["error_code"], 2003);
        assert_eq!(data["recoverable"], true);
    }
}
