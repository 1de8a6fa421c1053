//! RPC 服务器实现
//!
//! 连接循环由 stdin/stdout 和 WebSocket 两种传输共用。stdio 模式下整个进程对应一个会话。

use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use super::methods::RpcMethods;
use super::types::{
    JsonRpcNotification, OutboundMessage, OutputNotification, SessionStatus,
    SessionStatusNotification,
};
use crate::command::Dispatcher;
use crate::jobs::ProviderMode;
use crate::output::OutputKind;

/// 通知发送器，可以克隆并在多个地方使用
#[derive(Clone)]
pub struct NotificationSender {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl NotificationSender {
    pub fn new(tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self { tx }
    }

    /// 发送通知
    pub fn send(
        &self,
        notification: JsonRpcNotification,
    ) -> Result<(), mpsc::error::SendError<OutboundMessage>> {
        self.tx.send(OutboundMessage::Notification(notification))
    }

    /// 发送终端输出通知
    pub fn send_output(
        &self,
        session_id: &str,
        kind: OutputKind,
        lines: &[String],
    ) -> Result<(), mpsc::error::SendError<OutboundMessage>> {
        let params = OutputNotification {
            session_id: session_id.to_string(),
            kind,
            lines: lines.to_vec(),
        };
        self.send(JsonRpcNotification::new(
            "terminal.output",
            serde_json::to_value(params).unwrap_or_default(),
        ))
    }

    /// 发送会话状态变更通知
    pub fn send_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<(), mpsc::error::SendError<OutboundMessage>> {
        let params = SessionStatusNotification {
            session_id: session_id.to_string(),
            status,
        };
        self.send(JsonRpcNotification::new(
            "session.status",
            serde_json::to_value(params).unwrap_or_default(),
        ))
    }
}

/// stdio RPC 服务器
pub struct RpcServer {
    methods: RpcMethods,
}

impl RpcServer {
    /// 创建新的 RPC 服务器
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        session_id: impl Into<String>,
        history_cap: usize,
        list_limit: usize,
    ) -> Self {
        Self {
            methods: RpcMethods::new(dispatcher, session_id, history_cap, list_limit),
        }
    }

    /// 指定会话的初始数据源模式
    pub fn with_provider_mode(mut self, mode: ProviderMode) -> Self {
        self.methods.set_provider_mode(mode);
        self
    }

    /// 运行 RPC 服务器，直到 stdin 关闭
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_with(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// 在给定的输入输出上运行，每行一条 JSON-RPC 消息
    pub async fn run_with<R, W>(self, input: R, output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        serve_connection(self.methods, read_lines(input), write_lines(output)).await;
        tracing::info!("stdin 关闭，退出");
        Ok(())
    }
}

/// 服务一个连接，直到输入结束
///
/// 请求逐条处理，上一条完成前不读取下一条。通知和响应进入同一个队列，
/// 客户端收到的顺序就是产生的顺序。
pub async fn serve_connection<I, O>(methods: RpcMethods, incoming: I, outgoing: O)
where
    I: Stream<Item = String>,
    O: Sink<String> + Send + 'static,
    O::Error: std::fmt::Display + Send,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let mut methods = methods.with_notification_sender(NotificationSender::new(tx.clone()));
    let session_id = methods.session().id().to_string();

    let writer_session = session_id.clone();
    let writer = tokio::spawn(async move {
        futures::pin_mut!(outgoing);
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("消息序列化失败: {}", e);
                    continue;
                }
            };
            if let Err(e) = outgoing.send(json).await {
                tracing::debug!("会话 {} 写入失败: {}", writer_session, e);
                break;
            }
        }
    });

    methods.greet();

    futures::pin_mut!(incoming);
    while let Some(message) = incoming.next().await {
        let message = message.trim();
        if message.is_empty() {
            continue;
        }
        let response = methods.handle_message(message).await;
        if tx.send(OutboundMessage::Response(response)).is_err() {
            tracing::debug!("会话 {} 写任务已结束", session_id);
            break;
        }
    }

    methods.close();
    drop(methods);
    drop(tx);
    let _ = writer.await;
}

/// 按行读取；非 UTF-8 字节替换后照常交给 JSON 解析，由其返回解析错误
fn read_lines<R>(reader: R) -> impl Stream<Item = String>
where
    R: AsyncBufRead + Unpin,
{
    futures::stream::unfold(reader, |mut reader| async move {
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => Some((String::from_utf8_lossy(&buf).into_owned(), reader)),
            Err(e) => {
                tracing::warn!("读取输入失败: {}", e);
                None
            }
        }
    })
}

/// 每条消息写一行并立即刷新
fn write_lines<W>(writer: W) -> impl Sink<String, Error = std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    futures::sink::unfold(writer, |mut writer, line: String| async move {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<_, std::io::Error>(writer)
    })
}
