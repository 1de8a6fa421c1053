//! 会话持久化
//!
//! `save`/`load` 命令通过 SessionStorage 保存和恢复会话快照。
//! 提供内存存储和按会话一个 JSON 文件的目录存储。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::utils::error::ShellError;

/// 会话 ID 最大长度
const MAX_SESSION_ID_LEN: usize = 64;

/// 检查会话 ID 是否可作为存储键
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 会话存储接口
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// 保存会话快照
    async fn save(&self, session_id: &str, blob: &str) -> Result<(), ShellError>;

    /// 读取会话快照，不存在时返回 None
    async fn load(&self, session_id: &str) -> Result<Option<String>, ShellError>;
}

/// 内存存储（进程重启后丢失）
#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn save(&self, session_id: &str, blob: &str) -> Result<(), ShellError> {
        self.blobs
            .lock()
            .await
            .insert(session_id.to_string(), blob.to_string());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<String>, ShellError> {
        Ok(self.blobs.lock().await.get(session_id).cloned())
    }
}

/// 目录存储：每个会话一个 `<session_id>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 默认目录：`<data_dir>/jobshell/sessions`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("jobshell").join("sessions"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf, ShellError> {
        if !is_valid_session_id(session_id) {
            return Err(ShellError::storage(format!(
                "session id '{}' cannot be used as a storage key",
                session_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn save(&self, session_id: &str, blob: &str) -> Result<(), ShellError> {
        let path = self.path_for(session_id)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ShellError::storage(format!("cannot create {}: {}", self.dir.display(), e)))?;

        // 先写临时文件再重命名，避免留下半个快照
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, blob)
            .await
            .map_err(|e| ShellError::storage(format!("cannot write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ShellError::storage(format!("cannot write {}: {}", path.display(), e)))?;

        tracing::debug!("保存会话快照: {}", path.display());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<String>, ShellError> {
        let path = self.path_for(session_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ShellError::storage(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
