//! 会话状态存储
//!
//! 每个会话独占一份 SessionState：当前职位列表、书签、偏好和命令历史。
//! 所有操作同步且完整：越界和取值检查先于任何修改。

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::{Category, JobRecord};
use crate::utils::error::ShellError;

/// 默认历史记录上限
pub const DEFAULT_HISTORY_CAP: usize = 100;

/// 快照格式版本
const SNAPSHOT_VERSION: u32 = 1;

/// 终端主题
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Green,
    Blue,
    Amber,
    Red,
    Purple,
}

impl Theme {
    pub const ALL: [Theme; 5] = [Theme::Green, Theme::Blue, Theme::Amber, Theme::Red, Theme::Purple];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Green => "green",
            Theme::Blue => "blue",
            Theme::Amber => "amber",
            Theme::Red => "red",
            Theme::Purple => "purple",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ShellError::validation(format!(
                    "Invalid theme '{}'. Available: {}",
                    s,
                    Theme::names().join(", ")
                ))
            })
    }
}

/// 用户偏好
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    #[serde(default)]
    pub filter: Option<String>,
}

/// 书签：职位记录的副本，职位列表被替换后依然有效
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bookmark {
    #[serde(flatten)]
    pub job: JobRecord,
    pub bookmarked_at: DateTime<Utc>,
}

/// 添加书签的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkAdded {
    /// 新增书签
    Added(JobRecord),
    /// 相同职位已存在，不做修改
    AlreadyPresent(JobRecord),
}

/// 命令历史条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub seq: u64,
    pub line: String,
}

/// 有上限的命令历史，只追加
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandHistory {
    entries: VecDeque<HistoryEntry>,
    next_seq: u64,
    #[serde(skip, default = "default_history_cap")]
    cap: usize,
}

fn default_history_cap() -> usize {
    DEFAULT_HISTORY_CAP
}

impl CommandHistory {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq: 1,
            cap: cap.max(1),
        }
    }

    /// 追加一条记录，超出上限时丢弃最旧的记录
    pub fn push(&mut self, line: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(HistoryEntry {
            seq,
            line: line.into(),
        });
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// 调整上限，立即裁剪
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.max(1);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// 最近的 n 条记录，按时间顺序
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }
}

/// 会话状态
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    /// 最近一次抓取的完整结果，search/filter 从这里派生
    fetched: Vec<JobRecord>,
    /// 当前显示的列表，索引从 1 开始
    jobs: Vec<JobRecord>,
    category: Option<Category>,
    last_fetch: Option<DateTime<Utc>>,
    bookmarks: Vec<Bookmark>,
    preferences: Preferences,
    history: CommandHistory,
}

/// 带版本的序列化快照
#[derive(Serialize, Deserialize)]
struct Snapshot<S> {
    version: u32,
    state: S,
}

impl SessionState {
    /// 创建指定历史上限的空状态
    pub fn with_history_cap(cap: usize) -> Self {
        Self {
            history: CommandHistory::with_cap(cap),
            ..Default::default()
        }
    }

    // ============ 职位列表 ============

    /// 当前显示的职位
    pub fn get_jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    /// 最近一次抓取的全部职位
    pub fn fetched(&self) -> &[JobRecord] {
        &self.fetched
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    /// 整体替换当前显示的列表
    pub fn replace_jobs(&mut self, jobs: Vec<JobRecord>) {
        self.jobs = jobs;
    }

    /// 记录一次抓取结果：同时替换来源列表和显示列表，清除过滤条件
    pub fn set_fetched(&mut self, category: Category, jobs: Vec<JobRecord>) {
        self.fetched = jobs.clone();
        self.replace_jobs(jobs);
        self.category = Some(category);
        self.last_fetch = Some(Utc::now());
        self.preferences.filter = None;
    }

    /// 按 1 起始索引获取当前职位
    pub fn job_at(&self, index: usize) -> Result<&JobRecord, ShellError> {
        index
            .checked_sub(1)
            .and_then(|i| self.jobs.get(i))
            .ok_or_else(|| ShellError::index_out_of_range("job", index, self.jobs.len(), "list"))
    }

    // ============ 书签 ============

    /// 将当前列表中第 index 个职位加入书签
    pub fn add_bookmark(&mut self, index: usize) -> Result<BookmarkAdded, ShellError> {
        let job = self.job_at(index)?.clone();
        let key = job.bookmark_key();

        if self.bookmarks.iter().any(|b| b.job.bookmark_key() == key) {
            return Ok(BookmarkAdded::AlreadyPresent(job));
        }

        self.bookmarks.push(Bookmark {
            job: job.clone(),
            bookmarked_at: Utc::now(),
        });
        Ok(BookmarkAdded::Added(job))
    }

    /// 按书签列表中的 1 起始索引删除
    pub fn remove_bookmark(&mut self, index: usize) -> Result<Bookmark, ShellError> {
        let len = self.bookmarks.len();
        match index.checked_sub(1).filter(|i| *i < len) {
            Some(i) => Ok(self.bookmarks.remove(i)),
            None => Err(ShellError::index_out_of_range(
                "bookmark",
                index,
                len,
                "bookmarks",
            )),
        }
    }

    pub fn list_bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    // ============ 偏好 ============

    /// 设置偏好项
    ///
    /// 支持的键：`theme`、`filter`（空值清除过滤条件）。
    pub fn set_preference(&mut self, key: &str, value: &str) -> Result<(), ShellError> {
        match key.trim().to_ascii_lowercase().as_str() {
            "theme" => {
                self.preferences.theme = value.parse()?;
            }
            "filter" => {
                let value = value.trim();
                self.preferences.filter = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            other => {
                return Err(ShellError::validation(format!(
                    "Unknown preference '{}'. Available: theme, filter",
                    other
                )));
            }
        }
        Ok(())
    }

    pub fn get_preferences(&self) -> &Preferences {
        &self.preferences
    }

    // ============ 历史 ============

    pub fn append_history(&mut self, line: impl Into<String>) -> u64 {
        self.history.push(line)
    }

    pub fn get_history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn set_history_cap(&mut self, cap: usize) {
        self.history.set_cap(cap);
    }

    // ============ 重置与持久化 ============

    /// 清空职位、书签和偏好，保留命令历史
    pub fn reset_all(&mut self) {
        let history = std::mem::take(&mut self.history);
        *self = Self {
            history,
            ..Default::default()
        };
    }

    /// 序列化为带版本的 JSON 快照
    pub fn serialize(&self) -> Result<String, ShellError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            state: self,
        };
        serde_json::to_string(&snapshot)
            .map_err(|e| ShellError::storage(format!("failed to serialize session: {}", e)))
    }

    /// 从快照恢复状态
    ///
    /// 历史上限不在快照中，恢复后沿用 `history_cap`。
    pub fn deserialize(blob: &str, history_cap: usize) -> Result<Self, ShellError> {
        let snapshot: Snapshot<SessionState> = serde_json::from_str(blob)
            .map_err(|e| ShellError::storage(format!("corrupt session data: {}", e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ShellError::storage(format!(
                "unsupported session data version {}",
                snapshot.version
            )));
        }

        let mut state = snapshot.state;
        state.set_history_cap(history_cap);
        Ok(state)
    }
}


/// 会话状态的属性测试
#[cfg(test)]
mod proptests {
    use super::*;
    use crate::jobs::MockProvider;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// 对于任意历史上限和追加次数，历史长度不超过上限且序号严格递增
        #[test]
        fn prop_history_bounded_and_ordered(cap in 1usize..20, pushes in 0usize..60) {
            let mut history = CommandHistory::with_cap(cap);
            for i in 0..pushes {
                history.push(format!("line {}", i));
            }
            prop_assert_eq!(history.len(), pushes.min(cap));
            let seqs: Vec<u64> = history.entries().map(|e| e.seq).collect();
            prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        }

        /// 对于任意索引，越界的添加书签不修改书签集合
        #[test]
        fn prop_add_bookmark_total(index in 0usize..12) {
            let mut state = SessionState::default();
            state.set_fetched(Category::Internship, MockProvider::jobs_for(Category::Internship));
            let len = state.get_jobs().len();

            let result = state.add_bookmark(index);
            if index >= 1 && index <= len {
                prop_assert!(result.is_ok());
                prop_assert_eq!(state.list_bookmarks().len(), 1);
            } else {
                prop_assert!(matches!(result, Err(ShellError::NotFound(_))));
                prop_assert!(state.list_bookmarks().is_empty());
            }
        }
    }
}
