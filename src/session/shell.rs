//! 终端会话
//!
//! 每个连接独占一个 ShellSession，连接之间不共享可变状态。

use chrono::{DateTime, Utc};

use crate::jobs::ProviderMode;
use crate::output::OutputKind;
use crate::rpc::server::NotificationSender;
use crate::rpc::types::{SessionInfo, SessionStatus};
use crate::utils::state::LifecycleManager;

use super::state::SessionState;

/// 单个连接的终端会话
pub struct ShellSession {
    id: String,
    pub state: SessionState,
    mode: ProviderMode,
    lifecycle: LifecycleManager,
    notifier: Option<NotificationSender>,
    created_at: DateTime<Utc>,
}

impl ShellSession {
    pub fn new(id: impl Into<String>, history_cap: usize) -> Self {
        let id = id.into();
        Self {
            lifecycle: LifecycleManager::new(id.clone()),
            id,
            state: SessionState::with_history_cap(history_cap),
            mode: ProviderMode::default(),
            notifier: None,
            created_at: Utc::now(),
        }
    }

    /// 绑定通知发送器
    pub fn with_notifier(mut self, notifier: NotificationSender) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 设置数据源模式
    pub fn set_mode(&mut self, mode: ProviderMode) {
        self.mode = mode;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> ProviderMode {
        self.mode
    }

    /// 切换真实/模拟数据源，返回新模式
    pub fn toggle_mode(&mut self) -> ProviderMode {
        self.mode = self.mode.toggled();
        tracing::info!("会话 {} 数据源切换为 {}", self.id, self.mode.as_str());
        self.mode
    }

    pub fn status(&self) -> SessionStatus {
        self.lifecycle.status()
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut LifecycleManager {
        &mut self.lifecycle
    }

    /// 转换生命周期状态，成功时推送 `session.status` 通知
    pub fn set_status(&mut self, status: SessionStatus) -> bool {
        if self.lifecycle.status() == status {
            return true;
        }
        if !self.lifecycle.transition_to(status).is_success() {
            return false;
        }
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send_status(&self.id, status) {
                tracing::debug!("会话 {} 状态通知发送失败: {}", self.id, e);
            }
        }
        true
    }

    /// 推送带外输出行（如抓取进度）
    pub fn notify_output(&self, kind: OutputKind, lines: &[String]) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send_output(&self.id, kind, lines) {
                tracing::debug!("会话 {} 输出通知发送失败: {}", self.id, e);
            }
        }
    }

    /// 会话摘要
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            status: self.lifecycle.status(),
            provider_mode: self.mode,
            jobs: self.state.get_jobs().len(),
            fetched_jobs: self.state.fetched().len(),
            bookmarks: self.state.list_bookmarks().len(),
            history_len: self.state.get_history().len(),
            theme: self.state.get_preferences().theme,
            last_error: self.lifecycle.last_error().map(str::to_string),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_new_session_defaults() {
        let session = ShellSession::new("abc", 10);
        assert_eq!(session.id(), "abc");
        assert_eq!(session.mode(), ProviderMode::Mock);
        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.state.get_history().cap(), 10);
    }

    #[test]
    fn test_toggle_mode() {
        let mut session = ShellSession::new("abc", 10);
        assert_eq!(session.toggle_mode(), ProviderMode::Real);
        assert_eq!(session.toggle_mode(), ProviderMode::Mock);
    }

    #[test]
    fn test_set_status_notifies_once_per_transition() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session =
            ShellSession::new("abc", 10).with_notifier(NotificationSender::new(tx));

        assert!(session.set_status(SessionStatus::Busy));
        assert!(session.set_status(SessionStatus::Busy));
        assert!(session.set_status(SessionStatus::Connected));

        let first = rx.try_recv().unwrap().into_notification();
        assert_eq!(first.method, "session.status");
        assert_eq!(first.params.unwrap()["status"], "busy");
        let second = rx.try_recv().unwrap().into_notification();
        assert_eq!(second.params.unwrap()["status"], "connected");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut session = ShellSession::new("abc", 10);
        assert!(session.set_status(SessionStatus::Closed));
        assert!(!session.set_status(SessionStatus::Connected));
        assert_eq!(session.status(), SessionStatus::Closed);
    }

    #[test]
    fn test_info_counts() {
        let session = ShellSession::new("abc", 10);
        let info = session.info();
        assert_eq!(info.id, "abc");
        assert_eq!(info.jobs, 0);
        assert_eq!(info.provider_mode, ProviderMode::Mock);
    }
}
