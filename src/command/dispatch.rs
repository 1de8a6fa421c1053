//! 命令分发
//!
//! 解析一行输入并对会话状态执行对应操作。成功的命令在返回结果前写入历史；
//! 失败的命令不修改任何状态。

use std::sync::Arc;

use crate::jobs::{Category, JobRecord, ProviderSet};
use crate::output::export::{export_bookmarks, export_jobs, ExportTarget};
use crate::output::OutputKind;
use crate::rpc::types::SessionStatus;
use crate::session::{SessionState, SessionStorage, ShellSession};
use crate::utils::error::ShellError;

use super::complete::complete;
use super::outcome::{Outcome, StatusReport};
use super::parse::{Command, FilterExpr};

/// `history` 命令显示的条目数
const HISTORY_DISPLAY_LEN: usize = 10;

/// 命令分发器
///
/// 进程内共享，持有数据源和存储；会话状态由调用方按连接传入。
pub struct Dispatcher {
    providers: Arc<ProviderSet>,
    storage: Arc<dyn SessionStorage>,
}

impl Dispatcher {
    pub fn new(providers: Arc<ProviderSet>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { providers, storage }
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// 执行一行命令
    pub async fn dispatch(
        &self,
        session: &mut ShellSession,
        line: &str,
    ) -> Result<Outcome, ShellError> {
        let line = line.trim();
        let result = match Command::parse(line) {
            Ok(command) => {
                tracing::debug!("会话 {} 执行命令: {}", session.id(), command.name());
                let records_history = command.records_history();
                self.execute(session, command).await.map(|outcome| {
                    if records_history {
                        session.state.append_history(line);
                    }
                    outcome
                })
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => session.lifecycle_mut().clear_error(),
            Err(e) => session.lifecycle_mut().record_error(e),
        }
        result
    }

    async fn execute(
        &self,
        session: &mut ShellSession,
        command: Command,
    ) -> Result<Outcome, ShellError> {
        let outcome = match command {
            Command::Help => Outcome::Help,
            Command::Fetch(category) => self.fetch(session, category).await?,
            Command::List => Outcome::Jobs {
                jobs: session.state.get_jobs().to_vec(),
                fetched_total: session.state.fetched().len(),
            },
            Command::Open(index) => {
                let job = session.state.job_at(index)?;
                if job.link.trim().is_empty() {
                    return Err(ShellError::validation(format!(
                        "No link available for {} - {}",
                        job.company, job.title
                    )));
                }
                Outcome::Opened(job.clone())
            }
            Command::Search(keyword) => {
                // 未抓取时结果为空，不报错
                let matches: Vec<JobRecord> = session
                    .state
                    .fetched()
                    .iter()
                    .filter(|job| job.contains_text(&keyword))
                    .cloned()
                    .collect();
                let count = matches.len();
                session.state.replace_jobs(matches);
                Outcome::Searched { keyword, count }
            }
            Command::Filter(expr) => apply_filter(&mut session.state, expr)?,
            Command::Bookmark(index) => Outcome::Bookmarked(session.state.add_bookmark(index)?),
            Command::BookmarkRemove(index) => {
                Outcome::BookmarkRemoved(session.state.remove_bookmark(index)?)
            }
            Command::Bookmarks => Outcome::Bookmarks(session.state.list_bookmarks().to_vec()),
            Command::Export { format, target } => {
                let payload = match target {
                    ExportTarget::Jobs => export_jobs(session.state.get_jobs(), format)?,
                    ExportTarget::Bookmarks => {
                        export_bookmarks(session.state.list_bookmarks(), format)?
                    }
                };
                tracing::info!(
                    "会话 {} 导出 {} 条 {} 到 {}",
                    session.id(),
                    payload.count,
                    target.as_str(),
                    payload.filename
                );
                Outcome::Exported(payload)
            }
            Command::Theme(Some(theme)) => {
                session.state.set_preference("theme", theme.as_str())?;
                Outcome::ThemeChanged(theme)
            }
            Command::Theme(None) => Outcome::ThemeInfo(session.state.get_preferences().theme),
            Command::Preferences => Outcome::Preferences(session.state.get_preferences().clone()),
            Command::Save => {
                let blob = session.state.serialize()?;
                self.storage.save(session.id(), &blob).await?;
                tracing::info!("会话 {} 已保存", session.id());
                Outcome::Saved {
                    session_id: session.id().to_string(),
                }
            }
            Command::Load => {
                let blob = self.storage.load(session.id()).await?.ok_or_else(|| {
                    ShellError::storage("No saved session found. Use 'save' first.")
                })?;
                let cap = session.state.get_history().cap();
                session.state = SessionState::deserialize(&blob, cap)?;
                tracing::info!("会话 {} 已恢复", session.id());
                Outcome::Loaded {
                    jobs: session.state.get_jobs().len(),
                    bookmarks: session.state.list_bookmarks().len(),
                }
            }
            Command::Status => Outcome::Status(status_report(session)),
            Command::History => {
                Outcome::History(session.state.get_history().recent(HISTORY_DISPLAY_LEN))
            }
            Command::Reset => {
                session.state.reset_all();
                tracing::info!("会话 {} 已重置", session.id());
                Outcome::Reset
            }
            Command::Clear => Outcome::Clear,
            Command::Complete(partial) => Outcome::Completions(complete(&partial)),
        };
        Ok(outcome)
    }

    /// 抓取职位；等待期间会话处于 Busy 状态
    async fn fetch(
        &self,
        session: &mut ShellSession,
        category: Category,
    ) -> Result<Outcome, ShellError> {
        let mode = session.mode();
        session.set_status(SessionStatus::Busy);
        session.notify_output(
            OutputKind::Info,
            &[format!(
                "Fetching {} jobs ({} data)...",
                category.command_name(),
                mode.as_str()
            )],
        );

        let result = self.providers.fetch(mode, category).await;
        session.set_status(SessionStatus::Connected);

        let jobs = result?;
        let count = jobs.len();
        session.state.set_fetched(category, jobs);
        Ok(Outcome::Fetched {
            category,
            count,
            mode,
        })
    }
}

/// 从最近一次抓取结果中过滤，未抓取时报错
fn filter_fetched<F>(state: &SessionState, predicate: F) -> Result<Vec<JobRecord>, ShellError>
where
    F: Fn(&JobRecord) -> bool,
{
    if state.fetched().is_empty() {
        return Err(ShellError::validation(
            "No jobs loaded. Use 'fetch' to get job listings first.",
        ));
    }
    Ok(state
        .fetched()
        .iter()
        .filter(|job| predicate(job))
        .cloned()
        .collect())
}

fn apply_filter(state: &mut SessionState, expr: FilterExpr) -> Result<Outcome, ShellError> {
    let (matches, fallback_key) = match &expr {
        FilterExpr::Clear => {
            let all = state.fetched().to_vec();
            let count = all.len();
            state.replace_jobs(all);
            state.set_preference("filter", "")?;
            return Ok(Outcome::FilterCleared { count });
        }
        FilterExpr::Remote(remote) => (filter_fetched(state, |job| job.remote == *remote)?, None),
        FilterExpr::Field { field, value } => (
            filter_fetched(state, |job| job.field_contains(*field, value))?,
            None,
        ),
        FilterExpr::Text {
            needle,
            unknown_key,
        } => (
            filter_fetched(state, |job| job.contains_text(needle))?,
            unknown_key.clone(),
        ),
    };

    let description = describe_filter(&expr);
    let count = matches.len();
    state.replace_jobs(matches);
    state.set_preference("filter", &description)?;
    Ok(Outcome::Filtered {
        expr: description,
        count,
        fallback_key,
    })
}

/// 过滤表达式的规范文本，保存在偏好中
fn describe_filter(expr: &FilterExpr) -> String {
    match expr {
        FilterExpr::Remote(true) => "remote".to_string(),
        FilterExpr::Remote(false) => "remote=false".to_string(),
        FilterExpr::Field { field, value } => format!("{}={}", field.name(), value),
        FilterExpr::Text {
            needle,
            unknown_key: Some(key),
        } => format!("{}={}", key, needle),
        FilterExpr::Text { needle, .. } => needle.clone(),
        FilterExpr::Clear => String::new(),
    }
}

fn status_report(session: &ShellSession) -> StatusReport {
    let state = &session.state;
    let prefs = state.get_preferences();
    StatusReport {
        visible_jobs: state.get_jobs().len(),
        fetched_jobs: state.fetched().len(),
        bookmarks: state.list_bookmarks().len(),
        history_len: state.get_history().len(),
        theme: prefs.theme,
        filter: prefs.filter.clone(),
        category: state.category(),
        last_fetch: state.last_fetch(),
        provider_mode: session.mode(),
    }
}
