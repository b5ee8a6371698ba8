//! 图表导出
//!
//! 每种记录类型生成一张 PNG 折线图

use crate::error::{HealthError, HealthResult};
use crate::health::{HealthDataType, HealthRecord};
use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};

const VENDOR_PREFIXES: &[&str] = &[
    "HKQuantityTypeIdentifier",
    "HKCategoryTypeIdentifier",
    "HKDataType",
];

const LINE_COLOR: RGBColor = RGBColor(75, 192, 192);

/// 图表画布尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 8000,
            height: 1000,
        }
    }
}

/// 可读标题：`HKQuantityTypeIdentifierHeartRate` 变为 `Heart Rate`
pub fn chart_title(record_type: HealthDataType) -> String {
    let identifier = record_type.as_str();
    let stripped = VENDOR_PREFIXES
        .iter()
        .filter_map(|prefix| identifier.find(prefix).map(|at| (at, *prefix)))
        .min_by_key(|(at, _)| *at)
        .map(|(_, prefix)| identifier.replacen(prefix, "", 1))
        .unwrap_or_else(|| identifier.to_string());

    let mut title = String::with_capacity(stripped.len() * 2);
    for c in stripped.chars() {
        if c.is_ascii_uppercase() {
            title.push(' ');
        }
        title.push(c);
    }
    title.trim().to_string()
}

/// 小写文件名，非字母数字字符替换为 `_`
pub fn sanitize_file_name(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// 按开始时间排序的数据点，以及无法绘制的记录数
/// （缺少有效开始时间或数值不是有限数）
pub fn plot_points(records: &[HealthRecord]) -> (Vec<(DateTime<Utc>, f64)>, usize) {
    let mut points: Vec<(DateTime<Utc>, f64)> = records
        .iter()
        .filter_map(|record| match (record.start_date, record.value) {
            (Some(date), Some(value)) if value.is_finite() => Some((date, value)),
            _ => None,
        })
        .collect();
    let skipped = records.len() - points.len();
    points.sort_unstable_by_key(|(date, _)| *date);
    (points, skipped)
}

/// 将 `records` 绘制到 `<output_dir>/<标题文件名>.png`
///
/// 没有可绘制的数据时返回 `Ok(None)`，不写任何文件
pub fn generate_chart(
    records: &[HealthRecord],
    title: &str,
    y_label: &str,
    output_dir: &Path,
    options: &ChartOptions,
) -> HealthResult<Option<PathBuf>> {
    if records.is_empty() {
        tracing::warn!("No data to chart for {}", title);
        return Ok(None);
    }

    let (points, skipped) = plot_points(records);
    if skipped > 0 {
        tracing::warn!(
            "{} of {} records for {} have no usable date or value and are left out",
            skipped,
            records.len(),
            title
        );
    }
    if points.is_empty() {
        tracing::warn!("No plottable data to chart for {}", title);
        return Ok(None);
    }

    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(format!("{}.png", sanitize_file_name(title)));

    draw_line_chart(&output_path, &points, title, y_label, options).map_err(|e| {
        HealthError::Export {
            path: output_path.clone(),
            message: e.to_string(),
        }
    })?;

    tracing::info!("Chart saved: {}", output_path.display());
    Ok(Some(output_path))
}

fn draw_line_chart(
    path: &Path,
    points: &[(DateTime<Utc>, f64)],
    title: &str,
    y_label: &str,
    options: &ChartOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_range, y_range) = axis_ranges(points);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(y_label)
        .x_labels(20)
        .y_labels(10)
        .x_label_formatter(&|date: &DateTime<Utc>| date.format("%Y-%m-%d").to_string())
        .axis_desc_style(("sans-serif", 18))
        .draw()?;

    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        LINE_COLOR.stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}

/// 日期范围与数值范围，数值范围总是包含零
fn axis_ranges(points: &[(DateTime<Utc>, f64)]) -> (Range<DateTime<Utc>>, Range<f64>) {
    let first = points.first().map(|(date, _)| *date).unwrap_or_else(Utc::now);
    let mut last = points.last().map(|(date, _)| *date).unwrap_or(first);
    if last <= first {
        last = first + Duration::days(1);
    }

    let (min, max) = points
        .iter()
        .fold((0f64, 0f64), |(lo, hi), (_, v)| (lo.min(*v), hi.max(*v)));
    let span = if max > min { max - min } else { 1.0 };
    let low = if min < 0.0 { min - span * 0.05 } else { 0.0 };
    (first..last, low..max + span * 0.05)
}
