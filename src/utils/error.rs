use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedirectError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Sitemap XML error: {0}")]
    XmlError(#[from] roxmltree::Error),

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

    #[error("Sheet '{sheet}' has no column '{column}'")]
    MissingColumnError { sheet: String, column: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Output,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RedirectError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::XmlError(_) => ErrorCategory::Network,
            Self::SpreadsheetError(_) | Self::MissingColumnError { .. } => ErrorCategory::Input,
            Self::ZipError(_) | Self::CsvError(_) | Self::XlsxWriteError(_) | Self::IoError(_) => {
                ErrorCategory::Output
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the sitemap URL is reachable and try again",
            ErrorCategory::Input => {
                "Check that the workbook exists and contains the expected sheets and columns"
            }
            ErrorCategory::Output => "Check that the output directory is writable",
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::Processing => "Inspect the input rows reported in the log",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::SpreadsheetError(e) => format!("Could not read the input workbook: {}", e),
            Self::IoError(e) => format!("File operation failed: {}", e),
            Self::MissingColumnError { sheet, column } => {
                format!("Column '{}' is missing from sheet '{}'", column, sheet)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RedirectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical() {
        let err = RedirectError::MissingConfigError {
            field: "sitemap_redirects".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_missing_column_message() {
        let err = RedirectError::MissingColumnError {
            sheet: "Sheet1".to_string(),
            column: "url".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("'url'"));
    }
}
