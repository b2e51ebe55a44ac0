use crate::config::{
    OUTPUT_CSV_FIELD, SOURCE_CSV_FIELD, TEMPLATE_CSV_FIELD, TURBOTAX_COLUMNS,
};
use crate::core::ConfigProvider;
use crate::utils::error::{ConvertError, Result};
use crate::utils::validation::{validate_path, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Run configuration. Every section is optional in the TOML file; anything
/// left out falls back to [`ConvertConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub paths: PathsConfig,
    pub columns: ColumnsConfig,
    pub mapping: MappingConfig,
    pub dates: DatesConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source_csv: String,
    pub template_csv: String,
    pub output_csv: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_csv: "data/source_transactions.csv".to_string(),
            template_csv: "data/Custom_CSV_Template.csv".to_string(),
            output_csv: "output/turbotax_upload.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_subset: Option<Vec<String>>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            required: TURBOTAX_COLUMNS.iter().map(|c| c.to_string()).collect(),
            source_subset: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Source column name -> template column name.
    pub columns: HashMap<String, String>,
    /// Source transaction type -> template type label.
    pub types: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatesConfig {
    /// chrono strftime pattern; empty means "try the common layouts".
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub conform_to_template: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            conform_to_template: true,
        }
    }
}

impl ConvertConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConvertError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConvertError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConvertError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Effective configuration rendered back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConvertError::ConfigValidationError {
            field: "toml_rendering".to_string(),
            message: e.to_string(),
        })
    }
}

impl ConfigProvider for ConvertConfig {
    fn source_csv_path(&self) -> &str {
        &self.paths.source_csv
    }

    fn template_csv_path(&self) -> &str {
        &self.paths.template_csv
    }

    fn output_csv_path(&self) -> &str {
        &self.paths.output_csv
    }

    fn required_columns(&self) -> &[String] {
        &self.columns.required
    }

    fn source_subset(&self) -> Option<&[String]> {
        self.columns.source_subset.as_deref()
    }

    fn column_map(&self) -> &HashMap<String, String> {
        &self.mapping.columns
    }

    fn type_map(&self) -> &HashMap<String, String> {
        &self.mapping.types
    }

    fn date_format(&self) -> &str {
        &self.dates.format
    }

    fn conform_to_template(&self) -> bool {
        self.output.conform_to_template
    }
}

// 只檢查路徑；映射表與日期格式不做驗證，空值代表不處理
impl Validate for ConvertConfig {
    fn validate(&self) -> Result<()> {
        validate_path(SOURCE_CSV_FIELD, &self.paths.source_csv)?;
        validate_path(TEMPLATE_CSV_FIELD, &self.paths.template_csv)?;
        validate_path(OUTPUT_CSV_FIELD, &self.paths.output_csv)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();

        assert_eq!(config.source_csv_path(), "data/source_transactions.csv");
        assert_eq!(config.template_csv_path(), "data/Custom_CSV_Template.csv");
        assert_eq!(config.output_csv_path(), "output/turbotax_upload.csv");
        assert_eq!(config.required_columns().len(), 13);
        assert_eq!(config.required_columns()[0], "Date");
        assert_eq!(config.required_columns()[12], "Transaction ID");
        assert!(config.column_map().is_empty());
        assert!(config.type_map().is_empty());
        assert_eq!(config.date_format(), "");
        assert!(config.source_subset().is_none());
        assert!(config.conform_to_template());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ConvertConfig::from_toml_str("").unwrap();
        assert_eq!(config, ConvertConfig::default());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[paths]
source_csv = "in/coinbase.csv"
template_csv = "in/template.csv"
output_csv = "out/upload.csv"

[columns]
source_subset = ["timestamp", "kind", "asset"]

[mapping.columns]
asset = "Sent Asset"
"Quantity Transacted" = "Sent Amount"

[mapping.types]
buy = "Buy"
sell = "Sale"

[dates]
format = "%Y-%m-%d %H:%M"

[output]
conform_to_template = false
"#;

        let config = ConvertConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.source_csv_path(), "in/coinbase.csv");
        assert_eq!(config.output_csv_path(), "out/upload.csv");
        assert_eq!(config.source_subset().unwrap().len(), 3);
        assert_eq!(config.column_map()["Quantity Transacted"], "Sent Amount");
        assert_eq!(config.type_map()["sell"], "Sale");
        assert_eq!(config.date_format(), "%Y-%m-%d %H:%M");
        assert!(!config.conform_to_template());
        // required 未設定時仍使用預設欄位
        assert_eq!(config.required_columns().len(), 13);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COINVERT_TEST_DATA_DIR", "/tmp/exports");

        let toml_content = r#"
[paths]
source_csv = "${COINVERT_TEST_DATA_DIR}/source.csv"
template_csv = "${COINVERT_TEST_UNSET_VAR}/template.csv"
"#;

        let config = ConvertConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.paths.source_csv, "/tmp/exports/source.csv");
        assert_eq!(
            config.paths.template_csv,
            "${COINVERT_TEST_UNSET_VAR}/template.csv"
        );

        std::env::remove_var("COINVERT_TEST_DATA_DIR");
    }

    #[test]
    fn test_invalid_toml() {
        let err = ConvertConfig::from_toml_str("[paths\nsource_csv = ").unwrap_err();
        assert!(matches!(err, ConvertError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConvertConfig::default();
        assert!(config.validate().is_ok());

        config.paths.output_csv = String::new();
        match config.validate() {
            Err(ConvertError::InvalidConfigValueError { field, .. }) => {
                assert_eq!(field, "paths.output_csv")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_mappings_are_valid() {
        let config = ConvertConfig::from_toml_str("[mapping]\n[dates]\nformat = \"\"\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[paths]\nsource_csv = \"exports/binance.csv\"\n")
            .unwrap();

        let config = ConvertConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.source_csv_path(), "exports/binance.csv");
        assert_eq!(config.template_csv_path(), "data/Custom_CSV_Template.csv");
    }

    #[test]
    fn test_to_toml_string_round_trips() {
        let mut config = ConvertConfig::default();
        config
            .mapping
            .types
            .insert("staking".to_string(), "Income".to_string());

        let rendered = config.to_toml_string().unwrap();
        let parsed = ConvertConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
