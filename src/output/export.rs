//! 数据导出
//!
//! 将职位列表或书签序列化为 JSON 数组或 CSV 文本，作为下载内容原样发送给客户端。

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::jobs::JobRecord;
use crate::session::Bookmark;
use crate::utils::error::ShellError;

/// 职位记录的 CSV 表头，顺序与 JobRecord 字段一致
pub const JOB_CSV_HEADER: [&str; 9] = [
    "title",
    "company",
    "location",
    "link",
    "category",
    "remote",
    "posted_date",
    "description",
    "requirements",
];

/// CSV 行结束符
const CSV_LINE_END: &str = "\r\n";

/// 导出格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(token: &str) -> Result<Self, ShellError> {
        match token.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ShellError::validation("Format must be 'json' or 'csv'")),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// 导出对象
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    Jobs,
    Bookmarks,
}

impl ExportTarget {
    pub fn parse(token: &str) -> Result<Self, ShellError> {
        match token.to_ascii_lowercase().as_str() {
            "jobs" => Ok(ExportTarget::Jobs),
            "bookmarks" => Ok(ExportTarget::Bookmarks),
            _ => Err(ShellError::validation("Target must be 'jobs' or 'bookmarks'")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportTarget::Jobs => "jobs",
            ExportTarget::Bookmarks => "bookmarks",
        }
    }
}

/// 导出结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: String,
    pub format: ExportFormat,
    pub target: ExportTarget,
    pub count: usize,
    pub data: String,
}

impl ExportPayload {
    fn new(format: ExportFormat, target: ExportTarget, count: usize, data: String) -> Self {
        Self {
            filename: format!("jobshell_{}.{}", target.as_str(), format.extension()),
            format,
            target,
            count,
            data,
        }
    }
}

/// 导出职位列表
pub fn export_jobs(jobs: &[JobRecord], format: ExportFormat) -> Result<ExportPayload, ShellError> {
    if jobs.is_empty() {
        return Err(ShellError::validation("No jobs to export. Use 'fetch' first."));
    }

    let data = match format {
        ExportFormat::Json => serde_json::to_string_pretty(jobs)?,
        ExportFormat::Csv => {
            let rows = jobs.iter().map(job_csv_fields);
            write_csv(&JOB_CSV_HEADER, rows)
        }
    };
    Ok(ExportPayload::new(format, ExportTarget::Jobs, jobs.len(), data))
}

/// 导出书签，比职位多一列 `bookmarked_at`
pub fn export_bookmarks(
    bookmarks: &[Bookmark],
    format: ExportFormat,
) -> Result<ExportPayload, ShellError> {
    if bookmarks.is_empty() {
        return Err(ShellError::validation(
            "No bookmarks to export. Use 'bookmark <id>' first.",
        ));
    }

    let data = match format {
        ExportFormat::Json => serde_json::to_string_pretty(bookmarks)?,
        ExportFormat::Csv => {
            let mut header = JOB_CSV_HEADER.to_vec();
            header.push("bookmarked_at");
            let rows = bookmarks.iter().map(|b| {
                let mut fields = job_csv_fields(&b.job);
                fields.push(b.bookmarked_at.to_rfc3339());
                fields
            });
            write_csv(&header, rows)
        }
    };
    Ok(ExportPayload::new(
        format,
        ExportTarget::Bookmarks,
        bookmarks.len(),
        data,
    ))
}

fn job_csv_fields(job: &JobRecord) -> Vec<String> {
    vec![
        job.title.clone(),
        job.company.clone(),
        job.location.clone(),
        job.link.clone(),
        job.category.as_str().to_string(),
        job.remote.to_string(),
        job.posted_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        job.description.clone(),
        job.requirements.join("; "),
    ]
}

fn write_csv<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = header
        .iter()
        .map(|h| csv_escape(h))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(CSV_LINE_END);

    for row in rows {
        let line = row.iter().map(|f| csv_escape(f)).collect::<Vec<_>>().join(",");
        out.push_str(&line);
        out.push_str(CSV_LINE_END);
    }
    out
}

/// 含分隔符、引号或换行的字段加引号，内部引号加倍
pub fn csv_escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::Category;
    use chrono::Utc;

    fn bookmark(title: &str, company: &str) -> Bookmark {
        Bookmark {
            job: JobRecord::new(title, company, "Remote", "https://example.com/a", Category::Fulltime),
            bookmarked_at: Utc::now(),
        }
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_export_bookmarks_csv_single_row() {
        let payload = export_bookmarks(&[bookmark("A", "B")], ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = payload.data.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "title,company,location,link,category,remote,posted_date,description,requirements,bookmarked_at"
        );
        assert!(lines[1].starts_with("A,B,Remote,https://example.com/a,fulltime,true,,,"));
        assert_eq!(payload.filename, "jobshell_bookmarks.csv");
        assert_eq!(payload.count, 1);
    }

    #[test]
    fn test_export_bookmarks_json_parses_back() {
        let bookmarks = vec![bookmark("A", "B")];
        let payload = export_bookmarks(&bookmarks, ExportFormat::Json).unwrap();
        let parsed: Vec<Bookmark> = serde_json::from_str(&payload.data).unwrap();
        assert_eq!(parsed, bookmarks);

        let raw: serde_json::Value = serde_json::from_str(&payload.data).unwrap();
        assert_eq!(raw[0]["title"], "A");
        assert_eq!(raw[0]["company"], "B");
    }

    #[test]
    fn test_export_jobs_quotes_fields() {
        let job = JobRecord::new("Engineer, Platform", "Acme \"Labs\"", "NYC", "", Category::Newgrad)
            .with_requirements(["Rust", "Go"]);
        let payload = export_jobs(&[job], ExportFormat::Csv).unwrap();
        let row = payload.data.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Engineer, Platform\",\"Acme \"\"Labs\"\"\",NYC,,newgrad,false,"));
        assert!(row.ends_with("Rust; Go"));
        assert_eq!(payload.filename, "jobshell_jobs.csv");
    }

    #[test]
    fn test_export_empty_is_error() {
        assert!(matches!(
            export_jobs(&[], ExportFormat::Json),
            Err(ShellError::Validation(_))
        ));
        assert!(matches!(
            export_bookmarks(&[], ExportFormat::Csv),
            Err(ShellError::Validation(_))
        ));
    }

    #[test]
    fn test_format_and_target_parse() {
        assert_eq!(ExportFormat::parse("JSON").unwrap(), ExportFormat::Json);
        assert!(ExportFormat::parse("xml").is_err());
        assert_eq!(ExportTarget::parse("Bookmarks").unwrap(), ExportTarget::Bookmarks);
        assert!(ExportTarget::parse("all").is_err());
    }
}
