//! 导出模块
//!
//! JSON 文件与 PNG 折线图

pub mod chart;
pub mod json;

pub use chart::{chart_title, generate_chart, sanitize_file_name, ChartOptions};
pub use json::{export_json, read_json, JSON_FILE_NAME};
