//! 外部职位数据源
//!
//! 通过外部程序获取真实职位数据（例如包装职位列表库的脚本）。
//! 调用方式：`<program> <args...> <kind>`，kind 为 internship/new_grad/full_time，
//! 程序在 stdout 输出 JSON 数组。

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tokio::process::Command;

use crate::utils::error::ProviderError;

use super::provider::JobProvider;
use super::record::{Category, JobRecord};

/// 外部程序数据源
#[derive(Debug, Clone)]
pub struct ExternalProvider {
    program: String,
    args: Vec<String>,
}

impl ExternalProvider {
    /// 创建外部数据源
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 解析外部程序的输出
    pub fn parse_output(stdout: &str, category: Category) -> Result<Vec<JobRecord>, ProviderError> {
        let values: Vec<Value> = serde_json::from_str(stdout.trim()).map_err(|e| {
            ProviderError::Unavailable(format!("provider returned invalid JSON: {}", e))
        })?;

        let total = values.len();
        let jobs: Vec<JobRecord> = values
            .iter()
            .filter_map(|v| normalize_job(v, category))
            .collect();

        if jobs.len() < total {
            tracing::warn!("丢弃 {} 条无法识别的职位记录", total - jobs.len());
        }
        Ok(jobs)
    }
}

/// 按候选键名读取第一个非空字符串
fn string_field(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// 将外部记录规范化为 JobRecord
///
/// 非对象或既无职位名又无公司名的记录返回 None。
fn normalize_job(value: &Value, category: Category) -> Option<JobRecord> {
    let obj = value.as_object()?;

    let title = string_field(obj, &["title", "position"]);
    let company = string_field(obj, &["company", "company_name"]);
    if title.is_none() && company.is_none() {
        return None;
    }

    let location = string_field(obj, &["location", "locations"])
        .unwrap_or_else(|| "Location TBD".to_string());
    let link = string_field(obj, &["link", "url", "apply_url"]).unwrap_or_default();

    let mut job = JobRecord::new(
        title.unwrap_or_else(|| "Unknown Position".to_string()),
        company.unwrap_or_else(|| "Unknown Company".to_string()),
        location,
        link,
        category,
    );

    if let Some(remote) = obj.get("remote").and_then(Value::as_bool) {
        job = job.with_remote(remote);
    }
    if let Some(date) = string_field(obj, &["posted_date", "date_posted"])
        .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s.as_str()), "%Y-%m-%d").ok())
    {
        job = job.with_posted_date(date);
    }
    if let Some(description) = string_field(obj, &["description"]) {
        job = job.with_description(description);
    }
    if let Some(requirements) = obj.get("requirements").and_then(Value::as_array) {
        job = job.with_requirements(requirements.iter().filter_map(Value::as_str));
    }

    Some(job)
}

#[async_trait]
impl JobProvider for ExternalProvider {
    fn name(&self) -> &str {
        &self.program
    }

    async fn fetch(&self, category: Category) -> Result<Vec<JobRecord>, ProviderError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(category.provider_kind())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ProviderError::Unavailable(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().next().unwrap_or("no error output").trim().to_string();
            return Err(ProviderError::Unavailable(format!(
                "{} exited with {}: {}",
                self.program, output.status, reason
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_output(&stdout, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_normalizes_aliases() {
        let stdout = r#"[
            {"company": "Acme", "position": "SWE Intern", "url": "https://acme.dev/jobs/1",
             "location": "Remote", "date_posted": "2024-03-01T10:00:00", "requirements": ["Rust"]},
            {"company": "Globex", "title": "Platform Engineer", "apply_url": "https://globex.io",
             "location": "Boston, MA", "remote": true}
        ]"#;
        let jobs = ExternalProvider::parse_output(stdout, Category::Internship).unwrap();
        assert_eq!(jobs.len(), 2);

        assert_eq!(jobs[0].title, "SWE Intern");
        assert_eq!(jobs[0].link, "https://acme.dev/jobs/1");
        assert!(jobs[0].remote);
        assert_eq!(jobs[0].posted_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(jobs[0].requirements, vec!["Rust".to_string()]);

        assert_eq!(jobs[1].link, "https://globex.io");
        assert!(jobs[1].remote);
        assert_eq!(jobs[1].category, Category::Internship);
    }

    #[test]
    fn test_parse_output_skips_unrecognized_records() {
        let stdout = r#"[{"foo": 1}, "text", {"company": "Initech"}]"#;
        let jobs = ExternalProvider::parse_output(stdout, Category::Fulltime).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Unknown Position");
        assert_eq!(jobs[0].location, "Location TBD");
    }

    #[test]
    fn test_parse_output_rejects_invalid_json() {
        let result = ExternalProvider::parse_output("not json", Category::Newgrad);
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fetch_runs_program_with_kind_argument() {
        // $1 为追加的类别参数
        let provider = ExternalProvider::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"printf '[{"company":"Acme","title":"%s"}]' "$1""#.to_string(),
                "jobshell-test".to_string(),
            ],
        );
        let jobs = provider.fetch(Category::Newgrad).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "new_grad");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fetch_reports_failed_program() {
        let provider = ExternalProvider::new(
            "sh",
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
        );
        match provider.fetch(Category::Fulltime).await {
            Err(ProviderError::Unavailable(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_reports_missing_program() {
        let provider = ExternalProvider::new("/nonexistent/jobshell-provider", Vec::new());
        let result = provider.fetch(Category::Internship).await;
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
    }
}
