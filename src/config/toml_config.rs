use crate::config::{DEFAULT_CAPACITY_PER_YEAR, DEFAULT_ZIP_FILENAME};
use crate::core::ConfigProvider;
use crate::utils::error::{AllocError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub allocation: AllocationSettings,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSettings {
    pub name: Option<String>,
    pub capacity_per_year: Option<u32>,
    /// 批次以外已經用掉的單位，key 是年份
    pub committed: Option<BTreeMap<String, u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub period_column: Option<String>,
    pub units_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AllocError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AllocError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INPUT_FILE})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AllocError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn name(&self) -> &str {
        self.allocation.name.as_deref().unwrap_or("allocation")
    }

    pub fn capacity(&self) -> u32 {
        self.allocation
            .capacity_per_year
            .unwrap_or(DEFAULT_CAPACITY_PER_YEAR)
    }

    pub fn compression_enabled(&self) -> bool {
        self.output
            .compression
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }

    /// Committed units keyed by year; keys that are not years are an error.
    pub fn committed(&self) -> Result<BTreeMap<i32, u32>> {
        let Some(committed) = &self.allocation.committed else {
            return Ok(BTreeMap::new());
        };

        committed
            .iter()
            .map(|(key, &units)| {
                key.trim()
                    .parse::<i32>()
                    .map(|year| (year, units))
                    .map_err(|_| AllocError::InvalidConfigValueError {
                        field: "allocation.committed".to_string(),
                        value: key.clone(),
                        reason: "Key must be a year such as \"2024\"".to_string(),
                    })
            })
            .collect()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, &["csv", "tsv"])?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_positive_number("allocation.capacity_per_year", self.capacity(), 1)?;
        validation::validate_non_empty_string("input.period_column", self.period_column())?;
        validation::validate_non_empty_string("input.units_column", self.units_column())?;
        validation::validate_output_formats("output.formats", &self.output.formats)?;
        self.committed()?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn capacity_per_year(&self) -> u32 {
        self.capacity()
    }

    fn period_column(&self) -> &str {
        self.input.period_column.as_deref().unwrap_or("period")
    }

    fn units_column(&self) -> &str {
        self.input.units_column.as_deref().unwrap_or("units")
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn compression_filename(&self) -> Option<&str> {
        let compression = self.output.compression.as_ref().filter(|c| c.enabled)?;
        Some(compression.filename.as_deref().unwrap_or(DEFAULT_ZIP_FILENAME))
    }

    fn committed_units(&self) -> BTreeMap<i32, u32> {
        // validate() 已經擋掉不合法的 key
        self.committed().unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[allocation]
name = "research-2024"
capacity_per_year = 9

[allocation.committed]
"2024" = 4

[input]
path = "projects.csv"
period_column = "Period"

[output]
path = "./out"
formats = ["csv", "json"]

[output.compression]
enabled = true
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.name(), "research-2024");
        assert_eq!(config.capacity_per_year(), 9);
        assert_eq!(config.period_column(), "Period");
        assert_eq!(config.units_column(), "units");
        assert_eq!(config.compression_filename(), Some(DEFAULT_ZIP_FILENAME));
        assert_eq!(config.committed_units().get(&2024), Some(&4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_optional_sections_missing() {
        let toml_content = r#"
[allocation]

[input]
path = "projects.tsv"

[output]
path = "./out"
formats = ["tsv"]
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.capacity_per_year(), DEFAULT_CAPACITY_PER_YEAR);
        assert_eq!(config.compression_filename(), None);
        assert!(config.committed_units().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PMA_TEST_INPUT", "from-env.csv");

        let toml_content = r#"
[allocation]

[input]
path = "${PMA_TEST_INPUT}"

[output]
path = "./out"
formats = ["csv"]
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input_path(), "from-env.csv");

        std::env::remove_var("PMA_TEST_INPUT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[allocation]
capacity_per_year = 0

[input]
path = "projects.xlsx"

[output]
path = "./out"
formats = ["csv"]
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_committed_key_is_rejected() {
        let toml_content = r#"
[allocation]

[allocation.committed]
"next year" = 3

[input]
path = "projects.csv"

[output]
path = "./out"
formats = ["csv"]
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AllocError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name(), "research-2024");
    }
}
