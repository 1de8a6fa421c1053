//! 命令解析
//!
//! 将一行原始输入解析为带类型的 Command，解析失败返回 Validation 错误。
//! 第一个词（大小写不敏感）选择命令，其余为位置参数或 `key=value`。

use crate::jobs::{Category, JobField};
use crate::output::export::{ExportFormat, ExportTarget};
use crate::session::Theme;
use crate::utils::error::ShellError;

/// 所有命令名（不含别名），用于帮助和补全
pub const COMMAND_NAMES: &[&str] = &[
    "help",
    "fetch",
    "list",
    "filter",
    "open",
    "bookmark",
    "bookmarks",
    "export",
    "theme",
    "status",
    "history",
    "reset",
    "clear",
    "search",
    "preferences",
    "save",
    "load",
    "complete",
];

/// 过滤表达式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// `filter remote` / `filter remote=false`
    Remote(bool),
    /// `filter company=google`
    Field { field: JobField, value: String },
    /// 任意字段子串匹配；`unknown_key` 为退回前的未知键
    Text {
        needle: String,
        unknown_key: Option<String>,
    },
    /// `filter clear`
    Clear,
}

impl FilterExpr {
    /// 解析过滤表达式
    ///
    /// 未知键退回为对值的全文匹配。
    pub fn parse(expr: &str) -> Result<Self, ShellError> {
        let expr = expr.trim();
        let lower = expr.to_lowercase();

        if lower.is_empty() {
            return Err(ShellError::usage("filter <remote|key=value|text|clear>"));
        }
        if lower == "clear" {
            return Ok(FilterExpr::Clear);
        }
        if lower == "remote" {
            return Ok(FilterExpr::Remote(true));
        }

        if let Some((key, value)) = expr.split_once('=') {
            let key = key.trim().to_lowercase();
            let value = value.trim().to_string();
            if value.is_empty() {
                return Err(ShellError::usage("filter <key>=<value>"));
            }

            if key == "remote" {
                return parse_bool(&value).map(FilterExpr::Remote).ok_or_else(|| {
                    ShellError::validation("remote filter expects true or false")
                });
            }

            return Ok(match JobField::parse(&key) {
                Some(field) => FilterExpr::Field { field, value },
                None => FilterExpr::Text {
                    needle: value,
                    unknown_key: Some(key),
                },
            });
        }

        Ok(FilterExpr::Text {
            needle: expr.to_string(),
            unknown_key: None,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// 终端命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Fetch(Category),
    List,
    Open(usize),
    Search(String),
    Filter(FilterExpr),
    Bookmark(usize),
    BookmarkRemove(usize),
    Bookmarks,
    Export {
        format: ExportFormat,
        target: ExportTarget,
    },
    /// 无参数时显示当前主题
    Theme(Option<Theme>),
    Preferences,
    Save,
    Load,
    Status,
    History,
    Reset,
    Clear,
    Complete(String),
}

impl Command {
    /// 解析一行输入
    ///
    /// 空行不是命令，调用方应先过滤。
    pub fn parse(line: &str) -> Result<Command, ShellError> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match head.to_lowercase().as_str() {
            "help" => no_args(Command::Help, "help", &args)?,
            "fetch" => match args.as_slice() {
                [category] => Category::from_command_token(category)
                    .map(Command::Fetch)
                    .ok_or_else(|| {
                        ShellError::validation(format!(
                            "Invalid job type '{}'. Use: {}",
                            category,
                            Category::command_names().join(", ")
                        ))
                    })?,
                _ => return Err(ShellError::usage("fetch [internships|newgrad|fulltime]")),
            },
            "list" | "ls" | "jobs" => no_args(Command::List, "list", &args)?,
            "open" => match args.as_slice() {
                [id] => Command::Open(parse_index(id, "Job")?),
                _ => return Err(ShellError::usage("open <job_id>  (example: open 3)")),
            },
            "search" => {
                if rest.is_empty() {
                    return Err(ShellError::usage("search <keyword>"));
                }
                Command::Search(rest.to_string())
            }
            "filter" => Command::Filter(FilterExpr::parse(rest)?),
            "bookmark" => match args.as_slice() {
                [sub, id] if sub.eq_ignore_ascii_case("remove") => {
                    Command::BookmarkRemove(parse_index(id, "Bookmark")?)
                }
                [id] if !id.eq_ignore_ascii_case("remove") => {
                    Command::Bookmark(parse_index(id, "Job")?)
                }
                _ => {
                    return Err(ShellError::usage(
                        "bookmark <job_id>  or  bookmark remove <bookmark_id>",
                    ))
                }
            },
            "bookmarks" => no_args(Command::Bookmarks, "bookmarks", &args)?,
            "export" => match args.as_slice() {
                [format] => Command::Export {
                    format: ExportFormat::parse(format)?,
                    target: ExportTarget::Jobs,
                },
                [format, target] => Command::Export {
                    format: ExportFormat::parse(format)?,
                    target: ExportTarget::parse(target)?,
                },
                _ => return Err(ShellError::usage("export [json|csv] [jobs|bookmarks]")),
            },
            "theme" => match args.as_slice() {
                [] => Command::Theme(None),
                [name] => Command::Theme(Some(name.parse()?)),
                _ => return Err(ShellError::usage("theme <color>")),
            },
            "preferences" | "prefs" => no_args(Command::Preferences, "preferences", &args)?,
            "save" => no_args(Command::Save, "save", &args)?,
            "load" => no_args(Command::Load, "load", &args)?,
            "status" | "info" => no_args(Command::Status, "status", &args)?,
            "history" => no_args(Command::History, "history", &args)?,
            "reset" => no_args(Command::Reset, "reset", &args)?,
            "clear" => no_args(Command::Clear, "clear", &args)?,
            "complete" => Command::Complete(rest.to_string()),
            _ => return Err(ShellError::unknown_command(line)),
        };

        Ok(command)
    }

    /// 命令名（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Fetch(_) => "fetch",
            Command::List => "list",
            Command::Open(_) => "open",
            Command::Search(_) => "search",
            Command::Filter(_) => "filter",
            Command::Bookmark(_) => "bookmark",
            Command::BookmarkRemove(_) => "bookmark remove",
            Command::Bookmarks => "bookmarks",
            Command::Export { .. } => "export",
            Command::Theme(_) => "theme",
            Command::Preferences => "preferences",
            Command::Save => "save",
            Command::Load => "load",
            Command::Status => "status",
            Command::History => "history",
            Command::Reset => "reset",
            Command::Clear => "clear",
            Command::Complete(_) => "complete",
        }
    }

    /// 成功后是否写入命令历史
    ///
    /// `clear` 只影响显示；`load` 恢复的历史会整体替换当前历史。
    pub fn records_history(&self) -> bool {
        !matches!(self, Command::Clear | Command::Load)
    }
}

fn no_args(command: Command, name: &str, args: &[&str]) -> Result<Command, ShellError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(ShellError::validation(format!("'{}' takes no arguments", name)))
    }
}

fn parse_index(token: &str, what: &str) -> Result<usize, ShellError> {
    token
        .parse::<usize>()
        .map_err(|_| ShellError::validation(format!("{} ID must be a number, got '{}'", what, token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("help").unwrap(), Command::Help);
        assert_eq!(Command::parse("  LIST ").unwrap(), Command::List);
        assert_eq!(Command::parse("ls").unwrap(), Command::List);
        assert_eq!(Command::parse("info").unwrap(), Command::Status);
        assert_eq!(Command::parse("Clear").unwrap(), Command::Clear);
    }

    #[test]
    fn test_parse_fetch() {
        assert_eq!(
            Command::parse("fetch internships").unwrap(),
            Command::Fetch(Category::Internship)
        );
        assert_eq!(
            Command::parse("FETCH NewGrad").unwrap(),
            Command::Fetch(Category::Newgrad)
        );
        assert!(matches!(Command::parse("fetch"), Err(ShellError::Validation(_))));
        assert!(matches!(
            Command::parse("fetch contract"),
            Err(ShellError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_indices() {
        assert_eq!(Command::parse("open 3").unwrap(), Command::Open(3));
        assert_eq!(Command::parse("bookmark 2").unwrap(), Command::Bookmark(2));
        assert_eq!(
            Command::parse("bookmark remove 1").unwrap(),
            Command::BookmarkRemove(1)
        );
        assert!(matches!(Command::parse("open x"), Err(ShellError::Validation(_))));
        assert!(matches!(Command::parse("open -1"), Err(ShellError::Validation(_))));
        assert!(matches!(
            Command::parse("bookmark remove"),
            Err(ShellError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_search_keeps_rest_of_line() {
        assert_eq!(
            Command::parse("search machine learning").unwrap(),
            Command::Search("machine learning".to_string())
        );
        assert!(Command::parse("search").is_err());
    }

    #[test]
    fn test_parse_filter_expressions() {
        assert_eq!(FilterExpr::parse("remote").unwrap(), FilterExpr::Remote(true));
        assert_eq!(FilterExpr::parse("Remote=no").unwrap(), FilterExpr::Remote(false));
        assert_eq!(FilterExpr::parse("clear").unwrap(), FilterExpr::Clear);
        assert_eq!(
            FilterExpr::parse("location = NYC").unwrap(),
            FilterExpr::Field {
                field: JobField::Location,
                value: "NYC".to_string()
            }
        );
        assert_eq!(
            FilterExpr::parse("salary=100k").unwrap(),
            FilterExpr::Text {
                needle: "100k".to_string(),
                unknown_key: Some("salary".to_string())
            }
        );
        assert_eq!(
            FilterExpr::parse("san francisco").unwrap(),
            FilterExpr::Text {
                needle: "san francisco".to_string(),
                unknown_key: None
            }
        );
        assert!(FilterExpr::parse("").is_err());
        assert!(FilterExpr::parse("company=").is_err());
        assert!(FilterExpr::parse("remote=maybe").is_err());
    }

    #[test]
    fn test_parse_export() {
        assert_eq!(
            Command::parse("export json").unwrap(),
            Command::Export {
                format: ExportFormat::Json,
                target: ExportTarget::Jobs
            }
        );
        assert_eq!(
            Command::parse("export CSV bookmarks").unwrap(),
            Command::Export {
                format: ExportFormat::Csv,
                target: ExportTarget::Bookmarks
            }
        );
        assert!(Command::parse("export xml").is_err());
        assert!(Command::parse("export json everything").is_err());
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!(Command::parse("theme").unwrap(), Command::Theme(None));
        assert_eq!(
            Command::parse("theme blue").unwrap(),
            Command::Theme(Some(Theme::Blue))
        );
        assert!(matches!(Command::parse("theme neon"), Err(ShellError::Validation(_))));
    }

    #[test]
    fn test_no_arg_commands_reject_arguments() {
        assert!(matches!(Command::parse("list all"), Err(ShellError::Validation(_))));
        assert!(matches!(Command::parse("reset now"), Err(ShellError::Validation(_))));
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::parse("dance wildly").unwrap_err();
        assert!(matches!(err, ShellError::Validation(_)));
        assert!(err.to_string().contains("help"));
    }

    #[test]
    fn test_records_history() {
        assert!(Command::Reset.records_history());
        assert!(Command::Status.records_history());
        assert!(!Command::Clear.records_history());
        assert!(!Command::Load.records_history());
    }
}
