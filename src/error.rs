//! 错误处理
//!
//! 输入错误、文件错误、解析错误与导出错误的统一类型

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by extraction, export and the CLI driver.
#[derive(Error, Debug)]
pub enum HealthError {
    /// 缺少输入文件参数
    #[error("Missing input file argument. Usage: apple-health-parser <export.xml> [types...] [--format=json,png]")]
    MissingInput,

    /// 输入文件不存在
    #[error("File not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// 未知的健康数据类型
    #[error("Unknown health data type: {0}")]
    UnknownType(String),

    /// 文件无法打开或读取
    #[error("Cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// XML 结构错误
    #[error("Malformed XML in {} at byte {position}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        position: u64,
        message: String,
    },

    /// 导出失败（图表渲染等）
    #[error("Export to {} failed: {message}", .path.display())]
    Export { path: PathBuf, message: String },

    /// 写出文件时的 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HealthError {
    /// 是否属于用户输入错误（参数、路径、类型名）
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            HealthError::MissingInput | HealthError::InputNotFound(_) | HealthError::UnknownType(_)
        )
    }
}

/// 健康数据处理结果类型
pub type HealthResult<T> = Result<T, HealthError>;
