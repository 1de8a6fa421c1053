//! 输出格式化
//!
//! 纯函数：把分发结果转换为有序的输出帧（显示行或客户端信号）。

use serde::{Deserialize, Serialize};

use crate::command::{Outcome, StatusReport};
use crate::jobs::JobRecord;
use crate::session::{Bookmark, BookmarkAdded, HistoryEntry, Preferences, Theme};
use crate::utils::error::ShellError;

use super::export::ExportPayload;

/// 表格列宽
const ID_WIDTH: usize = 3;
const TITLE_WIDTH: usize = 36;
const COMPANY_WIDTH: usize = 20;
const LOCATION_WIDTH: usize = 20;

/// 默认列表最多显示的行数
pub const DEFAULT_LIST_LIMIT: usize = 20;

const HELP_TEXT: &str = "\
JOBSHELL - JOB HUNTING TERMINAL

JOB COMMANDS:
  fetch <type>            Fetch jobs (internships|newgrad|fulltime)
  list                    List current jobs (aliases: ls, jobs)
  open <id>               Open job link in new tab
  search <keyword>        Search across all job fields

FILTERING:
  filter remote           Show only remote jobs
  filter location=NYC     Filter by a field (title, company, location, link, category)
  filter <text>           Filter by text in any field
  filter clear            Show all fetched jobs again

BOOKMARKS:
  bookmark <id>           Bookmark a job by ID
  bookmark remove <id>    Remove a bookmark
  bookmarks               Show all bookmarked jobs

DATA EXPORT:
  export json [jobs|bookmarks]    Export to JSON format
  export csv [jobs|bookmarks]     Export to CSV format

CUSTOMIZATION:
  theme <color>           Change theme (green|blue|amber|red|purple)
  preferences             Show current preferences

SESSION:
  save                    Save session data
  load                    Load session data
  status                  Show session status and stats
  history                 Show command history
  reset                   Reset all session data
  clear                   Clear terminal screen
  complete <partial>      Suggest completions

EXAMPLES:
  > fetch internships
  > search python
  > bookmark 1
  > theme blue
  > export json bookmarks";

const WELCOME_TEXT: &str = "\
JOBSHELL - JOB HUNTING TERMINAL

Welcome to the job exploration terminal!
Type 'help' to see available commands.";

/// 显示行的类别，客户端据此着色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Welcome,
    Info,
    Success,
    Output,
    Error,
}

/// 输出帧
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputFrame {
    /// 一组显示行
    Lines { kind: OutputKind, lines: Vec<String> },
    /// 在新标签页打开链接
    OpenUrl { url: String },
    /// 切换主题
    SetTheme { theme: Theme },
    /// 清屏
    ClearScreen,
    /// 补全候选
    Completions { items: Vec<String> },
    /// 导出内容，原样下载
    Download(ExportPayload),
}

impl OutputFrame {
    pub fn lines<I, S>(kind: OutputKind, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OutputFrame::Lines {
            kind,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn line(kind: OutputKind, line: impl Into<String>) -> Self {
        OutputFrame::Lines {
            kind,
            lines: vec![line.into()],
        }
    }
}

/// 连接建立时的欢迎信息
pub fn welcome() -> OutputFrame {
    OutputFrame::lines(OutputKind::Welcome, WELCOME_TEXT.lines())
}

/// 将分发结果渲染为输出帧
pub fn render(result: &Result<Outcome, ShellError>, list_limit: usize) -> Vec<OutputFrame> {
    match result {
        Ok(outcome) => render_outcome(outcome, list_limit),
        Err(e) => vec![OutputFrame::line(OutputKind::Error, format!("Error: {}", e))],
    }
}

fn render_outcome(outcome: &Outcome, list_limit: usize) -> Vec<OutputFrame> {
    use OutputKind::*;

    match outcome {
        Outcome::Help => vec![OutputFrame::lines(Output, HELP_TEXT.lines())],
        Outcome::Fetched {
            category,
            count,
            mode,
        } => vec![OutputFrame::lines(
            Success,
            [
                format!("Fetched {} {} jobs ({} data).", count, category.command_name(), mode.as_str()),
                "Use 'list' to see them.".to_string(),
            ],
        )],
        Outcome::Jobs {
            jobs,
            fetched_total,
        } => {
            if jobs.is_empty() {
                let message = if *fetched_total == 0 {
                    "No jobs loaded. Use 'fetch' to get job listings first."
                } else {
                    "No jobs match current filters. Use 'filter clear' to show all fetched jobs."
                };
                return vec![OutputFrame::line(Info, message)];
            }
            vec![OutputFrame::lines(Output, job_table(jobs, list_limit))]
        }
        Outcome::Opened(job) => vec![
            OutputFrame::OpenUrl {
                url: job.link.clone(),
            },
            OutputFrame::line(Info, format!("Opening {} position in new tab...", job.company)),
        ],
        Outcome::Searched { keyword, count } => {
            if *count == 0 {
                vec![OutputFrame::line(Info, format!("No jobs found for '{}'.", keyword))]
            } else {
                vec![OutputFrame::line(
                    Success,
                    format!(
                        "Search results for '{}': {} jobs found. Use 'list' to see them.",
                        keyword, count
                    ),
                )]
            }
        }
        Outcome::Filtered {
            expr,
            count,
            fallback_key,
        } => {
            let mut frames = Vec::new();
            if let Some(key) = fallback_key {
                frames.push(OutputFrame::line(
                    Info,
                    format!("Unknown filter key '{}'; matching the value against all fields.", key),
                ));
            }
            frames.push(OutputFrame::lines(
                Success,
                [
                    format!("Filter applied: '{}'", expr),
                    format!("Found {} matching jobs", count),
                ],
            ));
            frames
        }
        Outcome::FilterCleared { count } => vec![OutputFrame::line(
            Success,
            format!("Filter cleared. Showing all {} fetched jobs.", count),
        )],
        Outcome::Bookmarked(BookmarkAdded::Added(job)) => vec![OutputFrame::line(
            Success,
            format!("Bookmarked: {} - {}", job.company, job.title),
        )],
        Outcome::Bookmarked(BookmarkAdded::AlreadyPresent(job)) => vec![OutputFrame::line(
            Info,
            format!("Job already bookmarked: {} - {}", job.company, job.title),
        )],
        Outcome::BookmarkRemoved(bookmark) => vec![OutputFrame::line(
            Success,
            format!("Removed bookmark: {} - {}", bookmark.job.company, bookmark.job.title),
        )],
        Outcome::Bookmarks(bookmarks) => {
            if bookmarks.is_empty() {
                return vec![OutputFrame::line(Info, "No bookmarks saved yet.")];
            }
            vec![OutputFrame::lines(Output, bookmark_table(bookmarks))]
        }
        Outcome::Exported(payload) => vec![
            OutputFrame::Download(payload.clone()),
            OutputFrame::line(
                Success,
                format!(
                    "Exported {} {} to {}",
                    payload.count,
                    payload.target.as_str(),
                    payload.filename
                ),
            ),
        ],
        Outcome::ThemeChanged(theme) => vec![
            OutputFrame::SetTheme { theme: *theme },
            OutputFrame::line(Success, format!("Theme changed to {}", theme)),
        ],
        Outcome::ThemeInfo(theme) => vec![OutputFrame::lines(
            Output,
            [
                format!("Current theme: {}", theme),
                format!("Available: {}", Theme::names().join(", ")),
                "Usage: theme <color>".to_string(),
            ],
        )],
        Outcome::Preferences(prefs) => vec![OutputFrame::lines(Output, preference_lines(prefs))],
        Outcome::Saved { session_id } => vec![OutputFrame::line(
            Success,
            format!("Session saved (id: {}).", session_id),
        )],
        Outcome::Loaded { jobs, bookmarks } => vec![OutputFrame::line(
            Success,
            format!("Session restored: {} jobs, {} bookmarks.", jobs, bookmarks),
        )],
        Outcome::Status(report) => vec![OutputFrame::lines(Output, status_lines(report))],
        Outcome::History(entries) => {
            if entries.is_empty() {
                return vec![OutputFrame::line(Info, "No command history yet.")];
            }
            vec![OutputFrame::lines(Output, history_lines(entries))]
        }
        Outcome::Reset => vec![OutputFrame::line(
            Success,
            "Session reset. Jobs, bookmarks and preferences cleared.",
        )],
        Outcome::Clear => vec![OutputFrame::ClearScreen],
        Outcome::Completions(items) => {
            if items.is_empty() {
                return vec![OutputFrame::line(Info, "No completions available.")];
            }
            vec![OutputFrame::Completions {
                items: items.clone(),
            }]
        }
    }
}

/// 按字符数截断，超长时以 `...` 结尾
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn table_header() -> Vec<String> {
    let header = format!(
        "{:>id$}  {:<title$}  {:<company$}  {}",
        "#",
        "TITLE",
        "COMPANY",
        "LOCATION",
        id = ID_WIDTH,
        title = TITLE_WIDTH,
        company = COMPANY_WIDTH,
    );
    let rule = "-".repeat(ID_WIDTH + TITLE_WIDTH + COMPANY_WIDTH + LOCATION_WIDTH + 6);
    vec![header, rule]
}

fn table_row(index: usize, job: &JobRecord) -> String {
    format!(
        "{:>id$}  {:<title$}  {:<company$}  {}",
        index,
        truncate(&job.title, TITLE_WIDTH),
        truncate(&job.company, COMPANY_WIDTH),
        truncate(&job.location, LOCATION_WIDTH),
        id = ID_WIDTH,
        title = TITLE_WIDTH,
        company = COMPANY_WIDTH,
    )
}

fn job_table(jobs: &[JobRecord], list_limit: usize) -> Vec<String> {
    let mut lines = vec![format!("SHOWING {} JOBS:", jobs.len())];
    lines.extend(table_header());
    lines.extend(
        jobs.iter()
            .take(list_limit)
            .enumerate()
            .map(|(i, job)| table_row(i + 1, job)),
    );

    if jobs.len() > list_limit {
        lines.push(format!("... and {} more jobs", jobs.len() - list_limit));
        lines.push("Use 'search' or 'filter' to narrow down results.".to_string());
    }
    lines
}

fn bookmark_table(bookmarks: &[Bookmark]) -> Vec<String> {
    let mut lines = vec![format!("BOOKMARKS ({}):", bookmarks.len())];
    lines.extend(table_header());
    for (i, bookmark) in bookmarks.iter().enumerate() {
        lines.push(table_row(i + 1, &bookmark.job));
        lines.push(format!(
            "{:>id$}  saved {}",
            "",
            bookmark.bookmarked_at.format("%Y-%m-%d %H:%M:%S"),
            id = ID_WIDTH,
        ));
    }
    lines
}

fn preference_lines(prefs: &Preferences) -> Vec<String> {
    vec![
        "USER PREFERENCES:".to_string(),
        format!("  theme:  {}", prefs.theme),
        format!("  filter: {}", prefs.filter.as_deref().unwrap_or("(none)")),
        String::new(),
        "Use 'theme <color>' to change theme.".to_string(),
    ]
}

fn status_lines(report: &StatusReport) -> Vec<String> {
    let last_fetch = match (report.last_fetch, report.category) {
        (Some(at), Some(category)) => format!(
            "{} ({})",
            at.format("%Y-%m-%d %H:%M:%S"),
            category.command_name()
        ),
        (Some(at), None) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "Never".to_string(),
    };

    vec![
        "SESSION STATUS:".to_string(),
        format!("  Visible jobs:      {}", report.visible_jobs),
        format!("  Total jobs loaded: {}", report.fetched_jobs),
        format!("  Bookmarks:         {}", report.bookmarks),
        format!("  History entries:   {}", report.history_len),
        format!("  Theme:             {}", report.theme),
        format!(
            "  Filter:            {}",
            report.filter.as_deref().unwrap_or("(none)")
        ),
        format!("  Data source:       {}", report.provider_mode.as_str()),
        format!("  Last fetch:        {}", last_fetch),
    ]
}

fn history_lines(entries: &[HistoryEntry]) -> Vec<String> {
    let mut lines = vec!["COMMAND HISTORY:".to_string()];
    lines.extend(entries.iter().map(|e| format!("  {:>4}  {}", e.seq, e.line)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{Category, MockProvider, ProviderMode};

    fn output_lines(frames: &[OutputFrame]) -> Vec<String> {
        frames
            .iter()
            .filter_map(|f| match f {
                OutputFrame::Lines { lines, .. } => Some(lines.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("this is far too long", 10), "this is...");
    }

    #[test]
    fn test_job_table_preserves_order() {
        let jobs = MockProvider::jobs_for(Category::Internship);
        let frames = render(
            &Ok(Outcome::Jobs {
                jobs: jobs.clone(),
                fetched_total: jobs.len(),
            }),
            DEFAULT_LIST_LIMIT,
        );
        let lines = output_lines(&frames);
        assert_eq!(lines[0], format!("SHOWING {} JOBS:", jobs.len()));

        let rows = &lines[3..];
        assert_eq!(rows.len(), jobs.len());
        for (i, (row, job)) in rows.iter().zip(&jobs).enumerate() {
            assert!(row.starts_with(&format!("{:>3}  ", i + 1)));
            assert!(row.contains(&job.company));
        }
    }

    #[test]
    fn test_job_table_respects_limit() {
        let jobs = MockProvider::jobs_for(Category::Internship);
        let lines = job_table(&jobs, 2);
        assert_eq!(lines.len(), 1 + 2 + 2 + 2);
        assert!(lines.iter().any(|l| l.contains("and 3 more jobs")));
    }

    #[test]
    fn test_empty_list_messages() {
        let frames = render(
            &Ok(Outcome::Jobs {
                jobs: Vec::new(),
                fetched_total: 0,
            }),
            DEFAULT_LIST_LIMIT,
        );
        assert_eq!(
            frames,
            vec![OutputFrame::line(
                OutputKind::Info,
                "No jobs loaded. Use 'fetch' to get job listings first."
            )]
        );

        let frames = render(
            &Ok(Outcome::Jobs {
                jobs: Vec::new(),
                fetched_total: 4,
            }),
            DEFAULT_LIST_LIMIT,
        );
        assert!(output_lines(&frames)[0].contains("No jobs match"));
    }

    #[test]
    fn test_error_rendering() {
        let frames = render(&Err(ShellError::validation("bad")), DEFAULT_LIST_LIMIT);
        assert_eq!(
            frames,
            vec![OutputFrame::line(OutputKind::Error, "Error: bad")]
        );
    }

    #[test]
    fn test_signals() {
        let job = MockProvider::jobs_for(Category::Fulltime).remove(0);
        let frames = render(&Ok(Outcome::Opened(job.clone())), DEFAULT_LIST_LIMIT);
        assert_eq!(frames[0], OutputFrame::OpenUrl { url: job.link });

        let frames = render(&Ok(Outcome::ThemeChanged(Theme::Blue)), DEFAULT_LIST_LIMIT);
        assert_eq!(frames[0], OutputFrame::SetTheme { theme: Theme::Blue });

        let frames = render(&Ok(Outcome::Clear), DEFAULT_LIST_LIMIT);
        assert_eq!(frames, vec![OutputFrame::ClearScreen]);
    }

    #[test]
    fn test_status_lines() {
        let report = StatusReport {
            visible_jobs: 2,
            fetched_jobs: 5,
            bookmarks: 1,
            history_len: 7,
            theme: Theme::Amber,
            filter: Some("remote".to_string()),
            category: None,
            last_fetch: None,
            provider_mode: ProviderMode::Mock,
        };
        let lines = status_lines(&report);
        assert!(lines.iter().any(|l| l.contains("Visible jobs:") && l.ends_with('2')));
        assert!(lines.iter().any(|l| l.contains("amber")));
        assert!(lines.iter().any(|l| l.ends_with("Never")));
    }

    #[test]
    fn test_frame_serialization() {
        let json = serde_json::to_value(OutputFrame::OpenUrl {
            url: "https://x.dev".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "open_url");
        assert_eq!(json["url"], "https://x.dev");

        let json = serde_json::to_value(OutputFrame::ClearScreen).unwrap();
        assert_eq!(json["type"], "clear_screen");

        let json = serde_json::to_value(welcome()).unwrap();
        assert_eq!(json["kind"], "welcome");
    }
}
