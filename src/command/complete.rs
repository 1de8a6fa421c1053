//! 命令补全
//!
//! 根据已输入的部分内容给出候选：命令名、类别、主题、导出格式和对象。

use crate::jobs::Category;
use crate::session::Theme;

use super::parse::COMMAND_NAMES;

/// 命令名候选的最大数量
const MAX_COMMAND_SUGGESTIONS: usize = 5;

/// 计算补全候选，返回完整的输入行
pub fn complete(partial: &str) -> Vec<String> {
    let ends_with_space = partial.ends_with(char::is_whitespace);
    let mut words: Vec<String> = partial.split_whitespace().map(str::to_lowercase).collect();

    // 正在输入的词（末尾有空格时为空）
    let current = if ends_with_space {
        String::new()
    } else {
        words.pop().unwrap_or_default()
    };

    if words.is_empty() {
        return COMMAND_NAMES
            .iter()
            .filter(|name| name.starts_with(current.as_str()))
            .take(MAX_COMMAND_SUGGESTIONS)
            .map(|name| name.to_string())
            .collect();
    }

    let candidates: Vec<&str> = match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["fetch"] => Category::command_names(),
        ["theme"] => Theme::names(),
        ["export"] => vec!["json", "csv"],
        ["export", "json" | "csv"] => vec!["jobs", "bookmarks"],
        ["bookmark"] => vec!["remove"],
        ["filter"] => vec!["remote", "clear", "title=", "company=", "location="],
        _ => Vec::new(),
    };

    let prefix = words.join(" ");
    candidates
        .into_iter()
        .filter(|c| c.starts_with(current.as_str()))
        .map(|c| format!("{} {}", prefix, c))
        .collect()
}
