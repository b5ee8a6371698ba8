//! 流程测试
//!
//! 测试命令行参数校验、输出目录创建与导出格式选择

use anyhow::Result;
use apple_health_parser::config::{ChartConfig, Cli, Config, ExportFormat, OutputConfig};
use apple_health_parser::health::HealthDataType;
use apple_health_parser::pipeline;
use apple_health_parser::HealthError;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample.xml")
}

/// 创建测试配置
fn create_test_config(temp_dir: &TempDir, formats: Vec<ExportFormat>) -> Config {
    Config {
        output: OutputConfig {
            directory: temp_dir.path().join("output").join("nested"),
            formats,
        },
        chart: ChartConfig {
            width: 800,
            height: 300,
        },
        ..Default::default()
    }
}

fn cli(input: Option<PathBuf>, types: &[&str]) -> Cli {
    Cli {
        input,
        types: types.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_missing_input_argument() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, vec![ExportFormat::Json]);

    let err = pipeline::run(&cli(None, &[]), &config).await.unwrap_err();
    assert!(matches!(err, HealthError::MissingInput));
    assert!(err.is_input_error());
}

#[tokio::test]
async fn test_input_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, vec![ExportFormat::Json]);
    let missing = temp_dir.path().join("export.xml");

    let err = pipeline::run(&cli(Some(missing), &["stepCount"]), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, HealthError::InputNotFound(_)));
    assert!(!config.output.directory.exists());
}

#[tokio::test]
async fn test_unknown_type_fails_before_file_access() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, vec![ExportFormat::Json]);
    // 输入文件不存在：如果先访问文件，会得到 InputNotFound
    let missing = temp_dir.path().join("export.xml");

    let err = pipeline::run(&cli(Some(missing), &["height", "steps"]), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, HealthError::UnknownType(ref name) if name == "steps"));
    assert!(!config.output.directory.exists());
}

#[tokio::test]
async fn test_json_only_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir, vec![ExportFormat::Json]);

    let summary = pipeline::run(&cli(Some(sample_path()), &["StepCount", "bodymass"]), &config).await?;

    assert_eq!(summary.output_dir, config.output.directory);
    assert_eq!(
        summary.counts,
        vec![(HealthDataType::BodyMass, 1), (HealthDataType::StepCount, 2)]
    );
    assert!(summary.charts.is_empty());

    let json_path = summary.json_path.expect("json export requested");
    assert_eq!(json_path, config.output.directory.join("health-data.json"));
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(json_path)?)?;
    assert_eq!(json["HKQuantityTypeIdentifierStepCount"][0]["value"], 1000.0);
    assert_eq!(json["HKQuantityTypeIdentifierStepCount"][0]["sourceName"], "Health");

    Ok(())
}

#[tokio::test]
async fn test_default_types_are_used() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir, vec![ExportFormat::Json]);

    let summary = pipeline::run(&cli(Some(sample_path()), &[]), &config).await?;

    assert_eq!(summary.counts.len(), 17);
    assert!(summary
        .counts
        .contains(&(HealthDataType::HeartRate, 1)));
    assert!(summary
        .counts
        .contains(&(HealthDataType::SleepDurationGoal, 0)));
    Ok(())
}

#[tokio::test]
async fn test_png_run_skips_empty_types() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir, vec![ExportFormat::Png]);

    let summary = pipeline::run(&cli(Some(sample_path()), &["oxygenSaturation"]), &config).await?;

    assert!(summary.json_path.is_none());
    assert!(summary.charts.is_empty());
    assert!(config.output.directory.exists());
    assert_eq!(std::fs::read_dir(&config.output.directory)?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_png_run_writes_chart() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = create_test_config(&temp_dir, vec![ExportFormat::Png]);

    let summary = pipeline::run(&cli(Some(sample_path()), &["stepCount"]), &config).await?;

    let chart = config.output.directory.join("step_count.png");
    assert!(chart.exists());
    assert!(std::fs::metadata(&chart)?.len() > 0);
    assert_eq!(summary.charts, vec![chart]);
    assert!(summary.json_path.is_none());
    Ok(())
}

#[tokio::test]
async fn test_malformed_export_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir, vec![ExportFormat::Json]);
    let input = temp_dir.path().join("export.xml");
    std::fs::write(&input, "<HealthData><Record type=").unwrap();

    let err = pipeline::run(&cli(Some(input), &["stepCount"]), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, HealthError::Parse { .. }));
    assert!(!config.output.directory.join("health-data.json").exists());
}
