//! JobShell CLI 入口点
//!
//! 默认启动 WebSocket 服务器；`stdio` 子命令通过 stdin/stdout 进行 JSON-RPC 通信，
//! 整个进程对应一个会话。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jobshell::command::Dispatcher;
use jobshell::config::{ShellConfig, StorageKind, DEFAULT_BIND_ADDR};
use jobshell::rpc::ws::resolve_session_id;
use jobshell::rpc::{RpcServer, WsServer};

#[derive(Parser, Debug)]
#[command(author, version, about = "JobShell - job hunting terminal backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    bind_addr: SocketAddr,

    #[arg(long, short, default_value = "info")]
    log_level: String,

    #[arg(long, default_value_t = 100, help = "Maximum retained history entries per session")]
    history_cap: usize,

    #[arg(long, default_value_t = 20, help = "Rows shown by 'list' before truncating")]
    list_limit: usize,

    #[arg(long, default_value_t = 30)]
    fetch_timeout_secs: u64,

    #[arg(long, help = "External program that prints job listings as JSON")]
    provider_command: Option<String>,

    #[arg(long = "provider-arg", allow_hyphen_values = true, help = "Argument passed to the provider command (repeatable)")]
    provider_args: Vec<String>,

    #[arg(long, help = "Start new sessions with the real provider instead of mock data")]
    real_provider: bool,

    #[arg(long, value_enum, default_value_t = StorageKind::Memory)]
    storage: StorageKind,

    #[arg(long, help = "Directory for saved sessions (file storage)")]
    storage_dir: Option<PathBuf>,

    #[arg(long = "cors-origin", help = "Allowed CORS origin (repeatable, default any)")]
    cors_origins: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve WebSocket sessions (default command)
    Serve,
    /// Serve a single session over stdin/stdout
    Stdio {
        #[arg(long, help = "Session key used for save/load")]
        session: Option<String>,
    },
}

impl Cli {
    fn to_config(&self) -> ShellConfig {
        ShellConfig {
            bind_addr: self.bind_addr,
            history_cap: self.history_cap,
            list_limit: self.list_limit,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            provider_command: self.provider_command.clone(),
            provider_args: self.provider_args.clone(),
            real_provider: self.real_provider,
            storage: self.storage,
            storage_dir: self.storage_dir.clone(),
            cors_origins: self.cors_origins.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 日志输出到 stderr，stdio 模式下 stdout 是 JSON-RPC 通道
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = cli.to_config();
    config.validate().context("配置无效")?;

    let providers = Arc::new(config.build_providers());
    let storage = config.build_storage().context("无法初始化会话存储")?;
    let dispatcher = Arc::new(Dispatcher::new(providers, storage));

    tracing::info!("JobShell {} 启动", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Stdio { session }) => {
            let session_id = resolve_session_id(session.as_deref());
            tracing::info!("stdio 模式，会话 {}", session_id);
            let server = RpcServer::new(
                dispatcher,
                session_id,
                config.history_cap,
                config.list_limit,
            )
            .with_provider_mode(config.initial_mode());
            server.run().await
        }
        Some(Commands::Serve) | None => WsServer::new(dispatcher, config).serve().await,
    }
}
