//! WebSocket 服务器
//!
//! 每个 WebSocket 连接对应一个终端会话，一条文本消息就是一条 JSON-RPC 请求。
//! 连接循环与 stdio 模式共用 `serve_connection`。
//! 另提供 `GET /health`。

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderValue;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use futures::{future, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::methods::RpcMethods;
use super::server::serve_connection;
use crate::command::Dispatcher;
use crate::config::ShellConfig;
use crate::session::is_valid_session_id;

/// 所有连接共享的只读状态
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    config: Arc<ShellConfig>,
    connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, config: Arc<ShellConfig>) -> Self {
        Self {
            dispatcher,
            config,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 当前连接数
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// 连接计数守卫，连接结束时自动减一
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub version: String,
}

/// `/ws` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// 客户端保存的会话键
    pub session: Option<String>,
}

/// 客户端提供合法的会话键时沿用，否则生成新的 UUID
pub fn resolve_session_id(key: Option<&str>) -> String {
    match key {
        Some(key) if is_valid_session_id(key) => key.to_string(),
        Some(key) => {
            tracing::warn!("忽略无效的会话键: {:?}", key);
            uuid::Uuid::new_v4().to_string()
        }
        None => uuid::Uuid::new_v4().to_string(),
    }
}

/// 构建路由
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let parsed: Result<Vec<HeaderValue>, _> = origins.iter().map(|o| o.parse()).collect();
    match parsed {
        Ok(origins) => CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            tracing::warn!("CORS 来源无效 ({})，允许任意来源", e);
            CorsLayer::permissive()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.connections(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<AppState>,
) -> Response {
    let session_id = resolve_session_id(query.session.as_deref());
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String) {
    let _guard = ConnectionGuard::new(state.connections.clone());
    tracing::info!("会话 {} 已连接 (当前 {} 个)", session_id, state.connections());

    let (sink, stream) = socket.split();

    let read_session = session_id.clone();
    let incoming = stream
        .take_while(move |message| {
            let open = match message {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!("会话 {} 读取失败: {}", read_session, e);
                    false
                }
            };
            future::ready(open)
        })
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(text.as_str().to_string()),
                _ => None,
            })
        });
    let outgoing = sink.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(Message::Text(text.into())))
    });

    let config = &state.config;
    let methods = RpcMethods::new(
        state.dispatcher.clone(),
        session_id,
        config.history_cap,
        config.list_limit,
    )
    .with_provider_mode(config.initial_mode());

    serve_connection(methods, incoming, outgoing).await;
}

/// WebSocket 服务器
pub struct WsServer {
    state: AppState,
    bind_addr: SocketAddr,
}

impl WsServer {
    pub fn new(dispatcher: Arc<Dispatcher>, config: ShellConfig) -> Self {
        let bind_addr = config.bind_addr;
        Self {
            state: AppState::new(dispatcher, Arc::new(config)),
            bind_addr,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// 监听并服务，直到收到 Ctrl-C
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("无法绑定 {}", self.bind_addr))?;

        tracing::info!("JobShell 服务启动: {}", self.bind_addr);
        tracing::info!("健康检查: http://{}/health", self.bind_addr);
        tracing::info!("WebSocket: ws://{}/ws", self.bind_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("服务器异常退出")?;

        tracing::info!("JobShell 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("无法监听 Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
