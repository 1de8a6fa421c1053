//! 职位数据源
//!
//! 职位数据完全委托给外部数据源，这里只定义接口和模式选择。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::ProviderError;

use super::record::{Category, JobRecord};

/// 默认抓取超时
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// 职位数据源接口
#[async_trait]
pub trait JobProvider: Send + Sync {
    /// 数据源名称（用于日志）
    fn name(&self) -> &str;

    /// 抓取指定类别的职位，按数据源返回的顺序
    async fn fetch(&self, category: Category) -> Result<Vec<JobRecord>, ProviderError>;
}

/// 数据源模式
///
/// 客户端的隐藏切换（Konami code）只翻转这个标记，命令状态机不感知。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// 内置模拟数据
    #[default]
    Mock,
    /// 外部真实数据源
    Real,
}

impl ProviderMode {
    pub fn toggled(self) -> Self {
        match self {
            ProviderMode::Mock => ProviderMode::Real,
            ProviderMode::Real => ProviderMode::Mock,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderMode::Mock => "mock",
            ProviderMode::Real => "real",
        }
    }
}

/// 数据源集合
///
/// 持有模拟数据源和可选的真实数据源，按会话的模式标记选择。
pub struct ProviderSet {
    mock: Arc<dyn JobProvider>,
    real: Option<Arc<dyn JobProvider>>,
    fetch_timeout: Duration,
}

impl ProviderSet {
    /// 创建数据源集合
    pub fn new(mock: Arc<dyn JobProvider>, real: Option<Arc<dyn JobProvider>>) -> Self {
        Self {
            mock,
            real,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// 设置抓取超时
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// 是否配置了真实数据源
    pub fn has_real(&self) -> bool {
        self.real.is_some()
    }

    /// 按模式选择数据源
    pub fn select(&self, mode: ProviderMode) -> Result<Arc<dyn JobProvider>, ProviderError> {
        match mode {
            ProviderMode::Mock => Ok(self.mock.clone()),
            ProviderMode::Real => self.real.clone().ok_or_else(|| {
                ProviderError::Unavailable(
                    "no real job provider configured (start with --provider-command)".to_string(),
                )
            }),
        }
    }

    /// 带超时地抓取职位
    pub async fn fetch(
        &self,
        mode: ProviderMode,
        category: Category,
    ) -> Result<Vec<JobRecord>, ProviderError> {
        let provider = self.select(mode)?;
        tracing::info!("从 {} 抓取 {} 职位", provider.name(), category);

        match tokio::time::timeout(self.fetch_timeout, provider.fetch(category)).await {
            Ok(Ok(jobs)) => {
                tracing::info!("{} 返回 {} 条职位", provider.name(), jobs.len());
                Ok(jobs)
            }
            Ok(Err(e)) => {
                tracing::warn!("{} 抓取失败: {}", provider.name(), e);
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    "{} 抓取超时 ({}秒)",
                    provider.name(),
                    self.fetch_timeout.as_secs()
                );
                Err(ProviderError::Unavailable(format!(
                    "fetch timed out after {}s",
                    self.fetch_timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::mock::MockProvider;

    struct SlowProvider;

    #[async_trait]
    impl JobProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(&self, _category: Category) -> Result<Vec<JobRecord>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(ProviderMode::default(), ProviderMode::Mock);
        assert_eq!(ProviderMode::Mock.toggled(), ProviderMode::Real);
        assert_eq!(ProviderMode::Real.toggled(), ProviderMode::Mock);
        assert_eq!(serde_json::to_string(&ProviderMode::Real).unwrap(), "\"real\"");
    }

    #[tokio::test]
    async fn test_real_mode_without_provider_is_unavailable() {
        let set = ProviderSet::new(Arc::new(MockProvider::new()), None);
        assert!(!set.has_real());
        let result = set.fetch(ProviderMode::Real, Category::Internship).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_mode_fetches() {
        let set = ProviderSet::new(Arc::new(MockProvider::new()), None);
        let jobs = set.fetch(ProviderMode::Mock, Category::Newgrad).await.unwrap();
        assert!(!jobs.is_empty());
        assert!(jobs.iter().all(|j| j.category == Category::Newgrad));
    }

    #[tokio::test]
    async fn test_fetch_timeout_reports_unavailable() {
        let set = ProviderSet::new(Arc::new(MockProvider::new()), Some(Arc::new(SlowProvider)))
            .with_fetch_timeout(Duration::from_millis(20));
        let result = set.fetch(ProviderMode::Real, Category::Fulltime).await;
        match result {
            Err(ProviderError::Unavailable(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
