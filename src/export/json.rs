//! JSON 导出
//!
//! 以类型标识符为键、格式化输出的提取结果

use crate::error::HealthResult;
use crate::health::ExtractionResult;
use std::path::{Path, PathBuf};

/// 输出目录中 JSON 文件的文件名
pub const JSON_FILE_NAME: &str = "health-data.json";

/// 将提取结果写入 `<output_dir>/health-data.json`
pub fn export_json(data: &ExtractionResult, output_dir: &Path) -> HealthResult<PathBuf> {
    let output_path = output_dir.join(JSON_FILE_NAME);
    let content = serde_json::to_string_pretty(data)?;
    std::fs::write(&output_path, content)?;

    tracing::info!("JSON data exported to: {}", output_path.display());
    Ok(output_path)
}

/// 读取之前导出的文件
pub fn read_json(path: &Path) -> HealthResult<ExtractionResult> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
