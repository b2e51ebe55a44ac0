use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("File not found: '{path}' (check {field})")]
    FileNotFound { path: String, field: String },

    #[error("Column '{column}' not found in source data")]
    MissingColumn { column: String },

    #[error("Duplicate column '{column}'")]
    DuplicateColumn { column: String },

    #[error("Failed to parse dates in '{column}' column with format '{format}'")]
    DateParseError { format: String, column: String },

    #[error("Failed to write output CSV to '{path}': {message}")]
    WriteFailure { path: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Mapping,
    Output,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Bad input, mapping or configuration the user can fix.
    High,
    /// I/O or internal failure.
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a run that failed with this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl ConvertError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::FileNotFound { .. } | ConvertError::CsvError(_) => ErrorCategory::Input,
            ConvertError::MissingColumn { .. }
            | ConvertError::DuplicateColumn { .. }
            | ConvertError::DateParseError { .. } => ErrorCategory::Mapping,
            ConvertError::WriteFailure { .. } => ErrorCategory::Output,
            ConvertError::ConfigValidationError { .. }
            | ConvertError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ConvertError::IoError(_) | ConvertError::ProcessingError { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConvertError::IoError(_) | ConvertError::ProcessingError { .. } => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    /// Points the user at the configuration field or input to inspect.
    pub fn recovery_suggestion(&self) -> String {
        match self {
            ConvertError::FileNotFound { field, .. } => {
                format!("Check {} in the configuration file", field)
            }
            ConvertError::MissingColumn { .. } => {
                "Check [mapping.columns] in the configuration file and the source CSV header"
                    .to_string()
            }
            ConvertError::DuplicateColumn { .. } => {
                "Make sure the source header and [mapping.columns] targets are unique".to_string()
            }
            ConvertError::DateParseError { .. } => {
                "Check dates.format in the configuration file and the source data values"
                    .to_string()
            }
            ConvertError::WriteFailure { .. } => {
                "Check paths.output_csv and the permissions of its directory".to_string()
            }
            ConvertError::CsvError(_) => {
                "Make sure the source CSV is well formed (same field count on every row)"
                    .to_string()
            }
            ConvertError::ConfigValidationError { field, .. }
            | ConvertError::InvalidConfigValueError { field, .. } => {
                format!("Fix {} in the configuration file", field)
            }
            ConvertError::IoError(_) => "Check file permissions and disk space".to_string(),
            ConvertError::ProcessingError { .. } => {
                "This is a bug, please report it with the input that triggered it".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConvertError::FileNotFound { path, .. } => {
                format!("Could not find the file '{}'", path)
            }
            ConvertError::MissingColumn { column } => format!(
                "Column '{}' is expected but does not exist in the source data",
                column
            ),
            ConvertError::DateParseError { column, format } => format!(
                "None of the values in '{}' could be read as dates using '{}'",
                column, format
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
