//! RPC 方法注册和调用
//!
//! 每个连接一个 RpcMethods，持有该连接的终端会话。

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::server::NotificationSender;
use super::types::{
    CommandRequest, CommandResponse, CompleteRequest, CompleteResponse, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, SessionStatus, ToggleResponse,
};
use crate::command::{complete, Dispatcher};
use crate::jobs::ProviderMode;
use crate::output::{render, welcome, OutputFrame, OutputKind};
use crate::session::ShellSession;
use crate::utils::error::ShellError;

/// RPC 方法处理器
pub struct RpcMethods {
    dispatcher: Arc<Dispatcher>,
    session: ShellSession,
    list_limit: usize,
}

impl RpcMethods {
    /// 为一个连接创建方法处理器
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        session_id: impl Into<String>,
        history_cap: usize,
        list_limit: usize,
    ) -> Self {
        Self {
            dispatcher,
            session: ShellSession::new(session_id, history_cap),
            list_limit,
        }
    }

    /// 绑定通知发送器
    pub fn with_notification_sender(mut self, sender: NotificationSender) -> Self {
        self.session = self.session.with_notifier(sender);
        self
    }

    /// 指定会话的初始数据源模式
    pub fn with_provider_mode(mut self, mode: ProviderMode) -> Self {
        self.set_provider_mode(mode);
        self
    }

    pub fn set_provider_mode(&mut self, mode: ProviderMode) {
        self.session.set_mode(mode);
    }

    pub fn session(&self) -> &ShellSession {
        &self.session
    }

    /// 推送欢迎信息
    pub fn greet(&self) {
        if let OutputFrame::Lines { kind, lines } = welcome() {
            self.session.notify_output(kind, &lines);
        }
    }

    /// 连接结束
    pub fn close(&mut self) {
        self.session.set_status(SessionStatus::Closed);
        tracing::info!("会话 {} 已关闭", self.session.id());
    }

    /// 处理一条原始消息
    pub async fn handle_message(&mut self, message: &str) -> JsonRpcResponse {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(format!("JSON 解析错误: {}", e)),
                );
            }
        };

        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("无效的 JSON-RPC 版本"),
            );
        }

        self.call(&request.method, request.params, request.id).await
    }

    /// 调用指定方法
    pub async fn call(
        &mut self,
        method: &str,
        params: Option<serde_json::Value>,
        id: serde_json::Value,
    ) -> JsonRpcResponse {
        let result = match method {
            "terminal.command" => match parse_params::<CommandRequest>(params) {
                Ok(request) => to_result(self.terminal_command(request).await),
                Err(e) => Err(e),
            },
            "terminal.complete" => match parse_params::<CompleteRequest>(params) {
                Ok(request) => to_result(CompleteResponse {
                    completions: complete(&request.partial),
                }),
                Err(e) => Err(e),
            },
            "session.info" => to_result(self.session.info()),
            "provider.toggle" => to_result(self.provider_toggle()),
            _ => return JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, e),
        }
    }

    /// 执行一行终端命令
    async fn terminal_command(&mut self, request: CommandRequest) -> CommandResponse {
        if request.line.trim().is_empty() {
            return CommandResponse {
                ok: true,
                error_type: None,
                frames: Vec::new(),
            };
        }

        let result = self
            .dispatcher
            .dispatch(&mut self.session, &request.line)
            .await;
        let frames = render(&result, self.list_limit);

        CommandResponse {
            ok: result.is_ok(),
            error_type: result.err().map(|e| e.error_type().to_string()),
            frames,
        }
    }

    /// 切换真实/模拟数据源
    fn provider_toggle(&mut self) -> ToggleResponse {
        let mode = self.session.toggle_mode();
        let mut lines = vec![format!("Data source switched to {} data.", mode.as_str())];
        if mode == ProviderMode::Real && !self.dispatcher.providers().has_real() {
            lines.push(
                "No real job provider is configured; 'fetch' will fail until one is.".to_string(),
            );
        }
        ToggleResponse {
            mode,
            frames: vec![OutputFrame::lines(OutputKind::Info, lines)],
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| ShellError::InvalidRequest("缺少参数".to_string()))?;
    serde_json::from_value(params)
        .map_err(|e| ShellError::InvalidRequest(format!("参数解析错误: {}", e)).into())
}

fn to_result<T: Serialize>(value: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| ShellError::Serialization(e).into())
}
