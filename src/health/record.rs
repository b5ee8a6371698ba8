//! 健康记录
//!
//! 记录模型、时间戳与数值的宽松解析

use super::types::HealthDataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 按请求类型分组的记录，每组保持文档顺序
pub type ExtractionResult = BTreeMap<HealthDataType, Vec<HealthRecord>>;

/// 一个 `Record` 元素对应的观测值
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    #[serde(rename = "type")]
    pub record_type: HealthDataType,
    /// 属性缺失或无法解析时为 `None`
    #[serde(with = "iso_timestamp")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(with = "iso_timestamp")]
    pub end_date: Option<DateTime<Utc>>,
    /// 缺失或为空时为 `None`，非数字时为 NaN
    pub value: Option<f64>,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

/// 匹配到的 `Record` 元素的原始属性文本
#[derive(Debug, Default, Clone)]
pub struct RecordAttributes {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub source_name: Option<String>,
}

impl HealthRecord {
    /// 构建记录，无效的日期或数值不会导致失败
    pub fn from_attributes(record_type: HealthDataType, attrs: RecordAttributes) -> Self {
        Self {
            record_type,
            start_date: attrs.start_date.as_deref().and_then(parse_timestamp),
            end_date: attrs.end_date.as_deref().and_then(parse_timestamp),
            value: parse_value(attrs.value.as_deref()),
            unit: attrs.unit.unwrap_or_default(),
            source_name: attrs.source_name,
        }
    }
}

/// 解析时间戳属性
///
/// 支持导出文件自带的 `2024-01-01 08:00:00 -0800` 格式、RFC 3339、
/// 不带时区的日期时间（按 UTC 处理）以及纯日期，其余返回 `None`
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 解析 `value` 属性：缺失或为空为 `None`，无法解析为 NaN
pub fn parse_value(raw: Option<&str>) -> Option<f64> {
    match raw {
        None | Some("") => None,
        Some(text) => Some(text.trim().parse::<f64>().unwrap_or(f64::NAN)),
    }
}

/// 带毫秒的 ISO 8601 UTC 时间
mod iso_timestamp {
    use super::parse_timestamp;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_timestamp))
    }
}
