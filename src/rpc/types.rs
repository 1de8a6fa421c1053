//! RPC 数据类型定义
//!
//! 定义 JSON-RPC 请求、响应和通知的数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::ProviderMode;
use crate::output::{OutputFrame, OutputKind};
use crate::session::Theme;

/// 会话状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// 已连接，空闲
    Connected,
    /// 正在等待数据源
    Busy,
    /// 已关闭
    Closed,
}

/// 会话信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    pub status: SessionStatus,
    pub provider_mode: ProviderMode,
    pub jobs: usize,
    pub fetched_jobs: usize,
    pub bookmarks: usize,
    pub history_len: usize,
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============ RPC 请求类型 ============

/// 执行命令请求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandRequest {
    pub line: String,
}

/// 执行命令响应
///
/// 命令级错误也走这个响应：`ok` 为 false，错误行在 `frames` 中。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub frames: Vec<OutputFrame>,
}

/// 补全请求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompleteRequest {
    pub partial: String,
}

/// 补全响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompleteResponse {
    pub completions: Vec<String>,
}

/// 数据源切换响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleResponse {
    pub mode: ProviderMode,
    pub frames: Vec<OutputFrame>,
}

// ============ RPC 通知类型 ============

/// 终端输出通知
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputNotification {
    pub session_id: String,
    pub kind: OutputKind,
    pub lines: Vec<String>,
}

/// 会话状态变更通知
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatusNotification {
    pub session_id: String,
    pub status: SessionStatus,
}

// ============ JSON-RPC 2.0 协议类型 ============

/// JSON-RPC 请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    pub id: serde_json::Value,
}

/// JSON-RPC 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

impl JsonRpcResponse {
    /// 创建成功响应
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// 创建错误响应
    pub fn error(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// 解析错误 (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    /// 无效请求 (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    /// 方法不存在 (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method.into()),
            data: None,
        }
    }
}

/// JSON-RPC 通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    /// 创建新通知
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// 发往客户端的消息
///
/// 通知和响应共用一个按产生顺序写出的队列。
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Notification(JsonRpcNotification),
    Response(JsonRpcResponse),
}

#[cfg(test)]
impl OutboundMessage {
    pub fn into_notification(self) -> JsonRpcNotification {
        match self {
            OutboundMessage::Notification(notification) => notification,
            OutboundMessage::Response(response) => panic!("expected notification: {:?}", response),
        }
    }
}


/// RPC 类型的属性测试
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn session_status_strategy() -> impl Strategy<Value = SessionStatus> {
        prop_oneof![
            Just(SessionStatus::Connected),
            Just(SessionStatus::Busy),
            Just(SessionStatus::Closed),
        ]
    }

    fn output_kind_strategy() -> impl Strategy<Value = OutputKind> {
        prop_oneof![
            Just(OutputKind::Welcome),
            Just(OutputKind::Info),
            Just(OutputKind::Success),
            Just(OutputKind::Output),
            Just(OutputKind::Error),
        ]
    }

    fn frame_strategy() -> impl Strategy<Value = OutputFrame> {
        prop_oneof![
            (output_kind_strategy(), prop::collection::vec("\\PC{0,30}", 0..4))
                .prop_map(|(kind, lines)| OutputFrame::Lines { kind, lines }),
            "https://[a-z]{1,10}\\.com".prop_map(|url| OutputFrame::OpenUrl { url }),
            Just(OutputFrame::ClearScreen),
            prop::collection::vec("[a-z ]{1,20}", 0..5)
                .prop_map(|items| OutputFrame::Completions { items }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// 对于任意 SessionStatus，序列化后再反序列化应产生等价对象
        #[test]
        fn prop_session_status_roundtrip(status in session_status_strategy()) {
            let json = serde_json::to_string(&status).unwrap();
            let deserialized: SessionStatus = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(status, deserialized);
        }

        /// 对于任意输出帧组成的响应，JSON 往返保持不变
        #[test]
        fn prop_command_response_roundtrip(
            ok in any::<bool>(),
            frames in prop::collection::vec(frame_strategy(), 0..5),
        ) {
            let response = CommandResponse {
                ok,
                error_type: if ok { None } else { Some("validation_error".to_string()) },
                frames,
            };
            let json = serde_json::to_string(&response).unwrap();
            let deserialized: CommandResponse = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(response, deserialized);
        }

        /// 对于任意会话 ID 和状态，状态通知往返保持不变
        #[test]
        fn prop_status_notification_roundtrip(
            session_id in "[a-f0-9-]{36}",
            status in session_status_strategy(),
        ) {
            let notif = SessionStatusNotification { session_id, status };
            let json = serde_json::to_string(&notif).unwrap();
            let deserialized: SessionStatusNotification = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(notif, deserialized);
        }
    }
}
