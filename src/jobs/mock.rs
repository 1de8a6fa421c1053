//! 模拟数据源
//!
//! 内置的固定职位列表，用于演示和测试，结果确定且不访问网络。

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::utils::error::ProviderError;

use super::provider::JobProvider;
use super::record::{Category, JobRecord};

/// (公司, 职位, 地点, 链接, 描述, 技能, 发布日期)
type MockRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static str,
);

const INTERNSHIPS: &[MockRow] = &[
    (
        "Google",
        "Software Engineering Intern",
        "Mountain View, CA",
        "https://careers.google.com/jobs",
        "Work on cutting-edge projects with experienced engineers.",
        &["Python", "Java", "Data Structures"],
        "2024-01-15",
    ),
    (
        "Microsoft",
        "Software Development Engineer Intern",
        "Seattle, WA",
        "https://careers.microsoft.com",
        "Build features for Microsoft products used by millions.",
        &["C++", "JavaScript", "React"],
        "2024-01-20",
    ),
    (
        "Meta",
        "Frontend Engineering Intern",
        "Remote",
        "https://www.metacareers.com",
        "Work on React applications at massive scale.",
        &["React", "TypeScript", "GraphQL"],
        "2024-01-25",
    ),
    (
        "Amazon",
        "Software Development Engineer Intern",
        "Austin, TX",
        "https://amazon.jobs",
        "Build scalable systems for AWS services.",
        &["Java", "Python", "AWS"],
        "2024-02-01",
    ),
    (
        "Spotify",
        "Data Science Intern",
        "New York, NY",
        "https://www.lifeatspotify.com/jobs",
        "Analyze user behavior and improve recommendation algorithms.",
        &["Python", "SQL", "Machine Learning"],
        "2024-02-05",
    ),
];

const NEW_GRAD: &[MockRow] = &[
    (
        "Apple",
        "Software Engineer - New Grad",
        "Cupertino, CA",
        "https://jobs.apple.com",
        "Join the team building the next generation of Apple products.",
        &["Swift", "Objective-C", "iOS Development"],
        "2024-01-10",
    ),
    (
        "Netflix",
        "Backend Engineer - New Grad",
        "Los Gatos, CA",
        "https://jobs.netflix.com",
        "Build microservices that power streaming for millions.",
        &["Java", "Spring", "Microservices"],
        "2024-01-18",
    ),
    (
        "Uber",
        "Software Engineer I",
        "San Francisco, CA",
        "https://www.uber.com/careers",
        "Work on systems that connect millions of riders and drivers.",
        &["Go", "Python", "Kubernetes"],
        "2024-02-01",
    ),
];

const FULL_TIME: &[MockRow] = &[
    (
        "OpenAI",
        "Senior Software Engineer",
        "San Francisco, CA",
        "https://openai.com/careers",
        "Build AI systems that benefit humanity.",
        &["Python", "TensorFlow", "Distributed Systems"],
        "2024-01-05",
    ),
    (
        "Stripe",
        "Staff Software Engineer",
        "Remote",
        "https://stripe.com/jobs",
        "Build the financial infrastructure for the internet.",
        &["Ruby", "Scala", "Financial Systems"],
        "2024-02-10",
    ),
];

/// 模拟数据源
#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    /// 指定类别的模拟职位
    pub fn jobs_for(category: Category) -> Vec<JobRecord> {
        let rows = match category {
            Category::Internship => INTERNSHIPS,
            Category::Newgrad => NEW_GRAD,
            Category::Fulltime => FULL_TIME,
        };

        rows.iter()
            .map(|(company, title, location, link, description, skills, posted)| {
                let job = JobRecord::new(*title, *company, *location, *link, category)
                    .with_description(*description)
                    .with_requirements(skills.iter().copied());
                match NaiveDate::parse_from_str(posted, "%Y-%m-%d") {
                    Ok(date) => job.with_posted_date(date),
                    Err(_) => job,
                }
            })
            .collect()
    }
}

#[async_trait]
impl JobProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, category: Category) -> Result<Vec<JobRecord>, ProviderError> {
        let jobs = Self::jobs_for(category);
        tracing::debug!("生成 {} 条模拟 {} 职位", jobs.len(), category);
        Ok(jobs)
    }
}
