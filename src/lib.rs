//! Apple Health Parser - Apple Health 导出解析器
//!
//! 流式筛选 export.xml 中的记录，导出 JSON 与折线图

pub mod config;
pub mod error;
pub mod export;
pub mod health;
pub mod pipeline;

pub use error::{HealthError, HealthResult};
