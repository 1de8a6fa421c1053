//! 命令执行结果
//!
//! 分发器返回的带标签结果，由输出格式化器转换为显示内容。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::jobs::{Category, JobRecord, ProviderMode};
use crate::output::export::ExportPayload;
use crate::session::{Bookmark, BookmarkAdded, HistoryEntry, Preferences, Theme};

/// 会话概况
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusReport {
    pub visible_jobs: usize,
    pub fetched_jobs: usize,
    pub bookmarks: usize,
    pub history_len: usize,
    pub theme: Theme,
    pub filter: Option<String>,
    pub category: Option<Category>,
    pub last_fetch: Option<DateTime<Utc>>,
    pub provider_mode: ProviderMode,
}

/// 成功执行的命令结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Help,
    Fetched {
        category: Category,
        count: usize,
        mode: ProviderMode,
    },
    /// 当前列表；`fetched_total` 用于区分“未抓取”和“过滤后为空”
    Jobs {
        jobs: Vec<JobRecord>,
        fetched_total: usize,
    },
    Opened(JobRecord),
    Searched {
        keyword: String,
        count: usize,
    },
    Filtered {
        expr: String,
        count: usize,
        fallback_key: Option<String>,
    },
    FilterCleared {
        count: usize,
    },
    Bookmarked(BookmarkAdded),
    BookmarkRemoved(Bookmark),
    Bookmarks(Vec<Bookmark>),
    Exported(ExportPayload),
    ThemeChanged(Theme),
    ThemeInfo(Theme),
    Preferences(Preferences),
    Saved {
        session_id: String,
    },
    Loaded {
        jobs: usize,
        bookmarks: usize,
    },
    Status(StatusReport),
    History(Vec<HistoryEntry>),
    Reset,
    Clear,
    Completions(Vec<String>),
}
