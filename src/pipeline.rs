//! 处理流程
//!
//! 解析类型名称 → 流式提取 → 导出 JSON / 图表

use crate::config::{Cli, Config, ExportFormat, OutputConfig};
use crate::error::{HealthError, HealthResult};
use crate::export::{chart_title, export_json, generate_chart, ChartOptions};
use crate::health::{extract, resolve_types, HealthDataType};
use std::path::{Path, PathBuf};

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    /// Record count per requested type
    pub counts: Vec<(HealthDataType, usize)>,
    pub json_path: Option<PathBuf>,
    pub charts: Vec<PathBuf>,
}

/// Validate the command line and run the whole pipeline.
///
/// Type names are resolved before the input path is touched, so a typo never
/// costs a scan of a large export.
pub async fn run(cli: &Cli, config: &Config) -> HealthResult<RunSummary> {
    let input = cli.input.as_deref().ok_or(HealthError::MissingInput)?;

    let friendly_names: &[String] = if cli.types.is_empty() {
        &config.types.defaults
    } else {
        &cli.types
    };
    let types = resolve_types(friendly_names)?;

    let input = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
    if !tokio::fs::try_exists(&input).await.unwrap_or(false) {
        return Err(HealthError::InputNotFound(input));
    }

    process_health_data(&input, &types, &config.output, &config.chart.options()).await
}

/// Extract `types` from `input` and write the configured exports.
pub async fn process_health_data(
    input: &Path,
    types: &[HealthDataType],
    output: &OutputConfig,
    chart_options: &ChartOptions,
) -> HealthResult<RunSummary> {
    tracing::info!("Processing Apple Health data...");

    let data = extract(input, types).await?;

    let output_dir = output.directory.clone();
    tokio::fs::create_dir_all(&output_dir).await?;

    let mut summary = RunSummary {
        output_dir: output_dir.clone(),
        counts: data.iter().map(|(ty, records)| (*ty, records.len())).collect(),
        ..Default::default()
    };

    if output.wants(ExportFormat::Json) {
        summary.json_path = Some(export_json(&data, &output_dir)?);
    }

    if output.wants(ExportFormat::Png) {
        for (record_type, records) in &data {
            tracing::info!("Processing {} records for type: {}", records.len(), record_type);
            if records.is_empty() {
                continue;
            }

            let title = chart_title(*record_type);
            let y_label = format!("Value ({})", records[0].unit);
            if let Some(path) =
                generate_chart(records, &title, &y_label, &output_dir, chart_options)?
            {
                summary.charts.push(path);
            }
        }
    }

    tracing::info!("All charts and JSON data saved to: {}", output_dir.display());
    Ok(summary)
}
