//! 运行配置
//!
//! 命令行参数汇总为 ShellConfig，校验后用于构建数据源、存储和服务器。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::jobs::provider::DEFAULT_FETCH_TIMEOUT;
use crate::jobs::{ExternalProvider, JobProvider, MockProvider, ProviderMode, ProviderSet};
use crate::output::DEFAULT_LIST_LIMIT;
use crate::session::{FileStorage, MemoryStorage, SessionStorage, DEFAULT_HISTORY_CAP};
use crate::utils::error::ShellError;

/// 默认监听地址
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// 会话存储类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    /// 进程内存，重启后丢失
    #[default]
    Memory,
    /// 每个会话一个 JSON 文件
    File,
}

/// 运行配置
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub bind_addr: SocketAddr,
    pub history_cap: usize,
    pub list_limit: usize,
    pub fetch_timeout: Duration,
    /// 外部职位数据程序
    pub provider_command: Option<String>,
    pub provider_args: Vec<String>,
    /// 新会话默认使用真实数据源
    pub real_provider: bool,
    pub storage: StorageKind,
    pub storage_dir: Option<PathBuf>,
    /// 为空时允许任意来源
    pub cors_origins: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            history_cap: DEFAULT_HISTORY_CAP,
            list_limit: DEFAULT_LIST_LIMIT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            provider_command: None,
            provider_args: Vec::new(),
            real_provider: false,
            storage: StorageKind::default(),
            storage_dir: None,
            cors_origins: Vec::new(),
        }
    }
}

impl ShellConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), ShellError> {
        if self.history_cap == 0 {
            return Err(ShellError::validation("history cap must be at least 1"));
        }
        if self.list_limit == 0 {
            return Err(ShellError::validation("list limit must be at least 1"));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ShellError::validation("fetch timeout must be positive"));
        }
        if self.real_provider && self.provider_command.is_none() {
            return Err(ShellError::validation(
                "--real-provider requires --provider-command",
            ));
        }
        if self
            .provider_command
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(ShellError::validation("provider command must not be empty"));
        }
        Ok(())
    }

    /// 新会话的初始数据源模式
    pub fn initial_mode(&self) -> ProviderMode {
        if self.real_provider {
            ProviderMode::Real
        } else {
            ProviderMode::Mock
        }
    }

    /// 构建数据源集合
    pub fn build_providers(&self) -> ProviderSet {
        let real = self.provider_command.as_ref().map(|program| {
            Arc::new(ExternalProvider::new(program.clone(), self.provider_args.clone()))
                as Arc<dyn JobProvider>
        });
        ProviderSet::new(Arc::new(MockProvider::new()), real).with_fetch_timeout(self.fetch_timeout)
    }

    /// 构建会话存储
    pub fn build_storage(&self) -> Result<Arc<dyn SessionStorage>, ShellError> {
        match self.storage {
            StorageKind::Memory => Ok(Arc::new(MemoryStorage::new())),
            StorageKind::File => {
                let dir = self
                    .storage_dir
                    .clone()
                    .or_else(FileStorage::default_dir)
                    .ok_or_else(|| {
                        ShellError::validation("no data directory found; pass --storage-dir")
                    })?;
                tracing::info!("会话存储目录: {}", dir.display());
                Ok(Arc::new(FileStorage::new(dir)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShellConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.list_limit, 20);
        assert_eq!(config.initial_mode(), ProviderMode::Mock);
        assert!(!config.build_providers().has_real());
    }

    #[test]
    fn test_validation_failures() {
        let config = ShellConfig {
            history_cap: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ShellConfig {
            real_provider: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ShellConfig {
            fetch_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_real_provider_config() {
        let config = ShellConfig {
            provider_command: Some("python3".to_string()),
            provider_args: vec!["fetch_jobs.py".to_string()],
            real_provider: true,
            fetch_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_mode(), ProviderMode::Real);

        let providers = config.build_providers();
        assert!(providers.has_real());
        assert_eq!(providers.fetch_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_file_storage_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShellConfig {
            storage: StorageKind::File,
            storage_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let storage = config.build_storage().unwrap();
        storage.save("abc", "{}").await.unwrap();
        assert!(dir.path().join("abc.json").exists());
    }
}
