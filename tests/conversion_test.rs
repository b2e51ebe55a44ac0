use anyhow::Result;
use coinvert::core::ConfigProvider;
use coinvert::{
    load_source, transform, write_output, ConvertConfig, ConvertError, EtlEngine,
    TemplatePipeline, Value,
};
use std::fs;
use tempfile::TempDir;

const TEMPLATE: &str = "Date,Type,Sent Asset,Sent Amount,Received Asset,Received Amount,Fee Asset,Fee Amount,Market Value Currency,Market Value,Description,Transaction Hash,Transaction ID\n";

const SOURCE: &str = "\
datetime,source_type,asset,amount,fee,tx_id
2024-01-05 09:30,buy,BTC,0.25,0.0001,abc-1
2024-03-17 14:02,sell,BTC,0.1,0.0001,abc-2
2024-07-04 08:00,staking_reward,ETH,0.002,,abc-3
2024-12-31 23:59,transfer,USDC,150,1,abc-4
";

fn write_config(dir: &TempDir, extra: &str) -> Result<String> {
    let base = dir.path().to_str().unwrap().replace('\\', "/");
    fs::write(dir.path().join("source.csv"), SOURCE)?;
    fs::write(dir.path().join("template.csv"), TEMPLATE)?;

    let config = format!(
        r#"
[paths]
source_csv = "{base}/source.csv"
template_csv = "{base}/template.csv"
output_csv = "{base}/output/nested/turbotax_upload.csv"

[mapping.columns]
asset = "Received Asset"
amount = "Received Amount"
fee = "Fee Amount"
tx_id = "Transaction ID"

[mapping.types]
buy = "Buy"
sell = "Sale"
staking_reward = "Income"

[dates]
format = "%Y-%m-%d %H:%M"
{extra}
"#
    );

    let config_path = format!("{}/coinvert.toml", base);
    fs::write(&config_path, config)?;
    Ok(config_path)
}

/// 完整流程：TOML 配置 -> 讀取 -> 轉換 -> 依範本寫出
#[test]
fn test_end_to_end_conversion() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = ConvertConfig::from_file(write_config(&temp_dir, "")?)?;

    let engine = EtlEngine::new(TemplatePipeline::new(config.clone()));
    let output_path = engine.run()?;

    assert_eq!(output_path, config.output_csv_path());
    let content = fs::read_to_string(&output_path)?;
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], TEMPLATE.trim_end());
    assert_eq!(lines[1], "1/5/2024 09:30,Buy,,,BTC,0.25,,0.0001,,,,,abc-1");
    assert_eq!(lines[2], "3/17/2024 14:02,Sale,,,BTC,0.1,,0.0001,,,,,abc-2");
    assert_eq!(lines[3], "7/4/2024 08:00,Income,,,ETH,0.002,,,,,,,abc-3");
    assert_eq!(lines[4], "12/31/2024 23:59,Unknown,,,USDC,150.0,,1.0,,,,,abc-4");

    Ok(())
}

#[test]
fn test_stages_preserve_row_count() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = ConvertConfig::from_file(write_config(&temp_dir, "")?)?;

    let source = load_source(config.source_csv_path(), None)?;
    let transformed = transform(source.clone(), &config)?;

    assert_eq!(source.row_count(), 4);
    assert_eq!(transformed.row_count(), source.row_count());
    assert_eq!(
        transformed.get(3, "Type"),
        Some(&Value::Str("Unknown".to_string()))
    );
    Ok(())
}

#[test]
fn test_missing_mapping_column_produces_no_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = ConvertConfig::from_file(write_config(&temp_dir, "")?)?;
    config
        .mapping
        .columns
        .insert("Spot Price".to_string(), "Market Value".to_string());
    let output = config.output_csv_path().to_string();

    let err = EtlEngine::new(TemplatePipeline::new(config))
        .run()
        .unwrap_err();

    assert!(matches!(err, ConvertError::MissingColumn { ref column } if column == "Spot Price"));
    assert!(err.recovery_suggestion().contains("mapping.columns"));
    assert!(!std::path::Path::new(&output).exists());
    Ok(())
}

#[test]
fn test_wrong_date_format_aborts() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = ConvertConfig::from_file(write_config(&temp_dir, "")?)?;
    config.dates.format = "%d.%m.%Y".to_string();

    let err = EtlEngine::new(TemplatePipeline::new(config))
        .run()
        .unwrap_err();

    assert!(matches!(err, ConvertError::DateParseError { ref format, .. } if format == "%d.%m.%Y"));
    Ok(())
}

#[test]
fn test_missing_source_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = ConvertConfig::from_file(write_config(&temp_dir, "")?)?;
    config.paths.source_csv = temp_dir
        .path()
        .join("does_not_exist.csv")
        .display()
        .to_string();

    let err = EtlEngine::new(TemplatePipeline::new(config))
        .run()
        .unwrap_err();

    match err {
        ConvertError::FileNotFound { path, field } => {
            assert!(path.ends_with("does_not_exist.csv"));
            assert_eq!(field, "paths.source_csv");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_source_subset_and_passthrough_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let extra = r#"
[columns]
source_subset = ["datetime", "source_type", "asset"]

[output]
conform_to_template = false
"#;
    let mut config = ConvertConfig::from_file(write_config(&temp_dir, extra)?)?;
    config.mapping.columns.clear();
    config
        .mapping
        .columns
        .insert("asset".to_string(), "Received Asset".to_string());

    let output_path = EtlEngine::new(TemplatePipeline::new(config)).run()?;

    let content = fs::read_to_string(output_path)?;
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("datetime,source_type,Received Asset,Date,Type")
    );
    assert_eq!(
        lines.next(),
        Some("2024-01-05 09:30,buy,BTC,1/5/2024 09:30,Buy")
    );
    Ok(())
}

#[test]
fn test_rerun_overwrites_with_identical_bytes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = ConvertConfig::from_file(write_config(&temp_dir, "")?)?;

    let data = transform(load_source(config.source_csv_path(), None)?, &config)?;
    let out = temp_dir.path().join("again").join("out.csv");

    write_output(&data, &out)?;
    let first = fs::read(&out)?;
    write_output(&data, &out)?;
    let second = fs::read(&out)?;

    assert_eq!(first, second);
    assert!(!first.starts_with(&[0xEF, 0xBB, 0xBF]));
    Ok(())
}
