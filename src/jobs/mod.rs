//! 职位数据模块
//!
//! 职位记录模型以及数据源（模拟数据、外部程序）。

pub mod external;
pub mod mock;
pub mod provider;
pub mod record;

pub use external::ExternalProvider;
pub use mock::MockProvider;
pub use provider::{JobProvider, ProviderMode, ProviderSet};
pub use record::{Category, JobField, JobRecord};
