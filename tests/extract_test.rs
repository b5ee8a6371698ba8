//! 提取测试
//!
//! 针对示例导出文件测试流式提取的筛选、顺序与错误处理

use apple_health_parser::export::{export_json, read_json};
use apple_health_parser::health::{extract, extract_with_stats, HealthDataType};
use apple_health_parser::HealthError;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample.xml")
}

#[tokio::test]
async fn test_step_count_record() {
    let result = extract(sample_path(), &[HealthDataType::StepCount])
        .await
        .unwrap();

    let steps = &result[&HealthDataType::StepCount];
    assert_eq!(steps.len(), 2);

    let record = &steps[0];
    assert_eq!(record.record_type, HealthDataType::StepCount);
    assert_eq!(record.value, Some(1000.0));
    assert_eq!(record.unit, "count");
    assert_eq!(record.source_name.as_deref(), Some("Health"));
}

#[tokio::test]
async fn test_body_mass_and_height_records() {
    let result = extract(
        sample_path(),
        &[HealthDataType::BodyMass, HealthDataType::Height],
    )
    .await
    .unwrap();

    let mass = &result[&HealthDataType::BodyMass][0];
    assert_eq!(mass.value, Some(65.0));
    assert_eq!(mass.unit, "kg");

    let height = &result[&HealthDataType::Height][0];
    assert_eq!(height.value, Some(170.0));
    assert_eq!(height.unit, "cm");
}

#[tokio::test]
async fn test_unrequested_types_are_dropped() {
    let result = extract(sample_path(), &[HealthDataType::BodyMass])
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[&HealthDataType::BodyMass].len(), 1);
    assert!(!result.contains_key(&HealthDataType::StepCount));
    for records in result.values() {
        assert!(records
            .iter()
            .all(|r| r.record_type == HealthDataType::BodyMass));
    }
}

#[tokio::test]
async fn test_requested_type_without_records_is_present() {
    let result = extract(sample_path(), &[HealthDataType::OxygenSaturation])
        .await
        .unwrap();

    assert_eq!(result.get(&HealthDataType::OxygenSaturation), Some(&Vec::new()));
}

#[tokio::test]
async fn test_document_order_is_kept() {
    let result = extract(sample_path(), &[HealthDataType::StepCount])
        .await
        .unwrap();

    let values: Vec<_> = result[&HealthDataType::StepCount]
        .iter()
        .map(|r| r.value)
        .collect();
    // 第二条记录的日期更早，但仍排在后面
    assert_eq!(values, vec![Some(1000.0), Some(250.0)]);
}

#[tokio::test]
async fn test_category_record_without_value() {
    let result = extract(sample_path(), &[HealthDataType::SleepAnalysis])
        .await
        .unwrap();

    let sleep = &result[&HealthDataType::SleepAnalysis][0];
    assert_eq!(sleep.value, None);
    assert_eq!(sleep.unit, "");
    assert!(sleep.start_date.is_some());
    assert!(sleep.end_date > sleep.start_date);
}

#[tokio::test]
async fn test_scan_statistics() {
    let (_, stats) = extract_with_stats(sample_path(), &[HealthDataType::HeartRate])
        .await
        .unwrap();

    assert_eq!(stats.records_seen, 7);
    assert_eq!(stats.records_matched, 1);
    assert_eq!(stats.records_skipped(), 6);
}

#[tokio::test]
async fn test_missing_file_is_file_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = extract(temp_dir.path().join("missing.xml"), &[HealthDataType::StepCount])
        .await
        .unwrap_err();

    assert!(matches!(err, HealthError::File { .. }));
}

#[tokio::test]
async fn test_malformed_file_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.xml");
    std::fs::write(
        &path,
        r#"<HealthData><Record type="HKQuantityTypeIdentifierStepCount" value="1"></HealthData>"#,
    )
    .unwrap();

    let err = extract(&path, &[HealthDataType::StepCount])
        .await
        .unwrap_err();
    assert!(matches!(err, HealthError::Parse { .. }));
}

#[tokio::test]
async fn test_json_round_trip() {
    let requested = [
        HealthDataType::StepCount,
        HealthDataType::HeartRate,
        HealthDataType::SleepAnalysis,
        HealthDataType::BodyMass,
        HealthDataType::WalkingSpeed,
    ];
    let data = extract(sample_path(), &requested).await.unwrap();

    let temp_dir = TempDir::new().unwrap();
    let path = export_json(&data, temp_dir.path()).unwrap();
    let reloaded = read_json(&path).unwrap();

    assert_eq!(reloaded, data);
    assert_eq!(reloaded.len(), requested.len());

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"startDate\": \"2024-01-02T08:00:00.000Z\""));
}
