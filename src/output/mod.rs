//! 输出模块
//!
//! 把命令结果渲染为终端显示行和客户端信号，以及导出内容的序列化。

pub mod export;
pub mod format;

pub use export::{export_bookmarks, export_jobs, ExportFormat, ExportPayload, ExportTarget};
pub use format::{render, welcome, OutputFrame, OutputKind, DEFAULT_LIST_LIMIT};
