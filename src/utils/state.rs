//! 会话生命周期管理
//!
//! 提供会话状态转换逻辑，以及最近一次命令错误的记录。
//!
//! ## 状态转换规则
//! - Connected -> Busy, Closed
//! - Busy -> Connected, Closed
//! - Closed -> (终态，不能转换)
//!
//! 命令错误不会改变生命周期状态，会话在任何错误之后仍可用。

use crate::rpc::types::SessionStatus;
use crate::utils::error::ShellError;

/// 状态转换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateTransitionResult {
    /// 转换成功
    Success,
    /// 转换无效（当前状态不允许转换到目标状态）
    Invalid {
        from: SessionStatus,
        to: SessionStatus,
        reason: String,
    },
}

impl StateTransitionResult {
    /// 检查转换是否成功
    pub fn is_success(&self) -> bool {
        matches!(self, StateTransitionResult::Success)
    }
}

/// 会话生命周期管理器
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    /// 当前状态
    current_status: SessionStatus,
    /// 会话 ID（用于日志）
    session_id: String,
    /// 最近一次命令错误
    last_error: Option<String>,
}

impl LifecycleManager {
    /// 创建新的生命周期管理器，初始状态为 Connected
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            current_status: SessionStatus::Connected,
            session_id: session_id.into(),
            last_error: None,
        }
    }

    /// 获取当前状态
    pub fn status(&self) -> SessionStatus {
        self.current_status
    }

    /// 最近一次命令错误
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 尝试转换到目标状态
    ///
    /// 如果转换有效，更新状态并返回 Success。
    /// 如果转换无效，保持当前状态并返回 Invalid。
    pub fn transition_to(&mut self, target: SessionStatus) -> StateTransitionResult {
        if Self::is_valid_transition(self.current_status, target) {
            let from = self.current_status;
            self.current_status = target;

            tracing::debug!(
                "会话 {} 状态转换: {:?} -> {:?}",
                self.session_id,
                from,
                target
            );

            StateTransitionResult::Success
        } else {
            let reason = Self::get_invalid_transition_reason(self.current_status, target);
            tracing::warn!(
                "会话 {} 无效状态转换: {:?} -> {:?}, 原因: {}",
                self.session_id,
                self.current_status,
                target,
                reason
            );

            StateTransitionResult::Invalid {
                from: self.current_status,
                to: target,
                reason,
            }
        }
    }

    /// 记录命令错误（不改变状态）
    pub fn record_error(&mut self, error: &ShellError) {
        tracing::debug!(
            "会话 {} 命令失败 [{}]: {}",
            self.session_id,
            error.error_type(),
            error
        );
        self.last_error = Some(error.to_string());
    }

    /// 清除错误记录
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// 检查状态转换是否有效
    pub fn is_valid_transition(from: SessionStatus, to: SessionStatus) -> bool {
        // 相同状态不需要转换
        if from == to {
            return true;
        }

        match from {
            SessionStatus::Connected => matches!(to, SessionStatus::Busy | SessionStatus::Closed),
            SessionStatus::Busy => matches!(to, SessionStatus::Connected | SessionStatus::Closed),
            SessionStatus::Closed => false,
        }
    }

    /// 获取无效转换的原因
    fn get_invalid_transition_reason(from: SessionStatus, to: SessionStatus) -> String {
        match from {
            SessionStatus::Closed => "会话已关闭，无法转换状态".to_string(),
            _ => format!("不支持从 {:?} 转换到 {:?}", from, to),
        }
    }
}
