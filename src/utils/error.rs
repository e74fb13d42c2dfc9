use crate::core::period::FormatError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Period format error: {0}")]
    FormatError(#[from] FormatError),

    #[error("Month range error: start {start} is after end {end}")]
    RangeError { start: NaiveDate, end: NaiveDate },

    #[error("Input is missing column '{column}' (found: {})", available.join(", "))]
    MissingColumnError {
        column: String,
        available: Vec<String>,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Io,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AllocError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AllocError::FormatError(_)
            | AllocError::MissingColumnError { .. }
            | AllocError::CsvError(_) => ErrorCategory::Input,
            AllocError::ConfigValidationError { .. }
            | AllocError::InvalidConfigValueError { .. }
            | AllocError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AllocError::IoError(_) | AllocError::ZipError(_) => ErrorCategory::Io,
            AllocError::SerializationError(_) | AllocError::RangeError { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AllocError::FormatError(_) => ErrorSeverity::Low,
            AllocError::IoError(_) | AllocError::ZipError(_) => ErrorSeverity::Medium,
            AllocError::CsvError(_)
            | AllocError::MissingColumnError { .. }
            | AllocError::ConfigValidationError { .. }
            | AllocError::InvalidConfigValueError { .. }
            | AllocError::MissingConfigError { .. } => ErrorSeverity::High,
            // 內部契約被破壞
            AllocError::SerializationError(_) | AllocError::RangeError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AllocError::FormatError(_) => {
                "Write periods as YYYY, MM/YYYY or DD/MM/YYYY, optionally as START-END".to_string()
            }
            AllocError::MissingColumnError { column, .. } => format!(
                "Add a '{}' column to the header row or pass the actual header name",
                column
            ),
            AllocError::CsvError(_) => {
                "Check that the input is a well-formed CSV/TSV file with a header row".to_string()
            }
            AllocError::IoError(_) => {
                "Check that the input file exists and the output directory is writable".to_string()
            }
            AllocError::ZipError(_) => {
                "Disable compression or check free disk space in the output directory".to_string()
            }
            AllocError::ConfigValidationError { field, .. }
            | AllocError::InvalidConfigValueError { field, .. }
            | AllocError::MissingConfigError { field } => {
                format!("Fix the '{}' setting and run again", field)
            }
            AllocError::SerializationError(_) | AllocError::RangeError { .. } => {
                "This is a bug; please report it together with the input file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The input could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Io => format!("File operation failed: {}", self),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_lists_available_headers() {
        let err = AllocError::MissingColumnError {
            column: "units".to_string(),
            available: vec!["period".to_string(), "notes".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Input is missing column 'units' (found: period, notes)"
        );
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_range_error_is_critical() {
        let err = AllocError::RangeError {
            start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.to_string().contains("2024-05-01"));
    }

    #[test]
    fn test_config_errors_point_at_field() {
        let err = AllocError::InvalidConfigValueError {
            field: "allocation.capacity_per_year".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert!(err.recovery_suggestion().contains("allocation.capacity_per_year"));
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }
}
