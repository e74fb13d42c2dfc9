pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY_PER_YEAR: u32 = 11;
pub const DEFAULT_ZIP_FILENAME: &str = "allocation_output.zip";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "person-month-alloc")]
#[command(about = "Allocate person-month units onto calendar months under a yearly capacity")]
pub struct CliConfig {
    /// Input CSV/TSV file with a period column and a units column
    #[arg(long)]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Maximum units any single year may hold
    #[arg(long, default_value_t = DEFAULT_CAPACITY_PER_YEAR)]
    pub capacity: u32,

    #[arg(long, default_value = "period")]
    pub period_column: String,

    #[arg(long, default_value = "units")]
    pub units_column: String,

    #[arg(long, value_delimiter = ',', default_value = "csv,json")]
    pub formats: Vec<String>,

    /// Bundle all output files into one ZIP archive
    #[arg(long)]
    pub zip: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn capacity_per_year(&self) -> u32 {
        self.capacity
    }

    fn period_column(&self) -> &str {
        &self.period_column
    }

    fn units_column(&self) -> &str {
        &self.units_column
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn compression_filename(&self) -> Option<&str> {
        self.zip.then_some(DEFAULT_ZIP_FILENAME)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension("input", &self.input, &["csv", "tsv"])?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("capacity", self.capacity, 1)?;
        validation::validate_non_empty_string("period_column", &self.period_column)?;
        validation::validate_non_empty_string("units_column", &self.units_column)?;
        validation::validate_output_formats("formats", &self.formats)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["person-month-alloc", "--input", "projects.csv"]);
        assert_eq!(config.capacity_per_year(), 11);
        assert_eq!(config.output_path(), "./output");
        assert_eq!(config.output_formats(), &["csv".to_string(), "json".to_string()]);
        assert_eq!(config.compression_filename(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides() {
        let config = CliConfig::parse_from([
            "person-month-alloc",
            "--input",
            "projects.tsv",
            "--capacity",
            "6",
            "--formats",
            "tsv",
            "--zip",
        ]);
        assert_eq!(config.capacity_per_year(), 6);
        assert_eq!(config.output_formats(), &["tsv".to_string()]);
        assert_eq!(config.compression_filename(), Some(DEFAULT_ZIP_FILENAME));
    }

    #[test]
    fn test_cli_validation_rejects_zero_capacity() {
        let config = CliConfig::parse_from([
            "person-month-alloc",
            "--input",
            "projects.csv",
            "--capacity",
            "0",
        ]);
        assert!(config.validate().is_err());
    }
}
