//! 健康数据模块
//!
//! 类型字典、记录模型与流式提取

pub mod extractor;
pub mod record;
pub mod types;

pub use extractor::{extract, extract_from_reader, extract_with_stats, ExtractStats};
pub use record::{ExtractionResult, HealthRecord, RecordAttributes};
pub use types::{lookup, resolve_types, HealthDataType, DEFAULT_FRIENDLY_TYPES};
