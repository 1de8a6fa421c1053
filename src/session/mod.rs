//! 会话模块
//!
//! 会话状态、持久化存储和每个连接的终端会话。

pub mod shell;
pub mod state;
pub mod storage;

pub use shell::ShellSession;
pub use state::{
    Bookmark, BookmarkAdded, CommandHistory, HistoryEntry, Preferences, SessionState, Theme,
    DEFAULT_HISTORY_CAP,
};
pub use storage::{is_valid_session_id, FileStorage, MemoryStorage, SessionStorage};
