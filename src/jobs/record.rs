//! 职位记录
//!
//! 定义职位记录、职位类别以及可过滤字段。

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 地点中出现这些词时视为远程职位
const REMOTE_MARKERS: [&str; 3] = ["remote", "anywhere", "distributed"];

/// 职位类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 实习
    Internship,
    /// 应届生
    Newgrad,
    /// 全职
    Fulltime,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Internship, Category::Newgrad, Category::Fulltime];

    /// 命令行中使用的名称（`fetch internships`）
    pub fn command_name(&self) -> &'static str {
        match self {
            Category::Internship => "internships",
            Category::Newgrad => "newgrad",
            Category::Fulltime => "fulltime",
        }
    }

    /// 序列化与导出时使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Internship => "internship",
            Category::Newgrad => "newgrad",
            Category::Fulltime => "fulltime",
        }
    }

    /// 外部职位数据程序使用的名称
    pub fn provider_kind(&self) -> &'static str {
        match self {
            Category::Internship => "internship",
            Category::Newgrad => "new_grad",
            Category::Fulltime => "full_time",
        }
    }

    /// 解析命令参数，大小写不敏感，同时接受单数形式
    pub fn from_command_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "internships" | "internship" => Some(Category::Internship),
            "newgrad" | "new_grad" => Some(Category::Newgrad),
            "fulltime" | "full_time" => Some(Category::Fulltime),
            _ => None,
        }
    }

    /// 所有命令名，用于提示和补全
    pub fn command_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.command_name()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `filter key=value` 支持的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    Title,
    Company,
    Location,
    Link,
    Category,
    Description,
    Requirements,
}

impl JobField {
    /// 解析字段名，未知字段返回 None
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "title" | "position" => Some(JobField::Title),
            "company" => Some(JobField::Company),
            "location" => Some(JobField::Location),
            "link" | "url" => Some(JobField::Link),
            "category" | "type" => Some(JobField::Category),
            "description" => Some(JobField::Description),
            "requirements" | "skills" => Some(JobField::Requirements),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobField::Title => "title",
            JobField::Company => "company",
            JobField::Location => "location",
            JobField::Link => "link",
            JobField::Category => "category",
            JobField::Description => "description",
            JobField::Requirements => "requirements",
        }
    }
}

/// 职位记录
///
/// 在会话内通过当前列表中的 1 起始位置标识，没有稳定的外部 ID。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub category: Category,
    pub remote: bool,
    #[serde(default)]
    pub posted_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl JobRecord {
    /// 创建职位记录，远程标记由地点推断
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        link: impl Into<String>,
        category: Category,
    ) -> Self {
        let location = location.into();
        Self {
            title: title.into(),
            company: company.into(),
            remote: Self::infer_remote(&location),
            location,
            link: link.into(),
            category,
            posted_date: None,
            description: String::new(),
            requirements: Vec::new(),
        }
    }

    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_posted_date(mut self, date: NaiveDate) -> Self {
        self.posted_date = Some(date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    /// 根据地点文本推断是否远程
    pub fn infer_remote(location: &str) -> bool {
        let location = location.to_lowercase();
        REMOTE_MARKERS.iter().any(|m| location.contains(m))
    }

    /// 书签去重键：优先使用链接，没有链接时退回 公司+职位
    pub fn bookmark_key(&self) -> String {
        if self.link.trim().is_empty() {
            format!("{}_{}", self.company, self.title).to_lowercase()
        } else {
            self.link.trim().to_string()
        }
    }

    /// 指定字段的文本
    pub fn field_text(&self, field: JobField) -> String {
        match field {
            JobField::Title => self.title.clone(),
            JobField::Company => self.company.clone(),
            JobField::Location => self.location.clone(),
            JobField::Link => self.link.clone(),
            JobField::Category => self.category.as_str().to_string(),
            JobField::Description => self.description.clone(),
            JobField::Requirements => self.requirements.join(" "),
        }
    }

    /// 指定字段是否包含子串（大小写不敏感）
    pub fn field_contains(&self, field: JobField, needle: &str) -> bool {
        self.field_text(field)
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }

    /// 任意文本字段是否包含子串（大小写不敏感）
    pub fn contains_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            JobField::Title,
            JobField::Company,
            JobField::Location,
            JobField::Link,
            JobField::Category,
            JobField::Description,
            JobField::Requirements,
        ]
        .iter()
        .any(|f| self.field_text(*f).to_lowercase().contains(&needle))
    }
}
