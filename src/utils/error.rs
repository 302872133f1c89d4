use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Spreadsheet write failed: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Reddit API returned {status}: {message}")]
    RedditApiError { status: u16, message: String },

    #[error("Spreadsheet error: {message}")]
    SpreadsheetError { message: String },

    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Configuration,
    Storage,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TrackerError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputError {
            message: message.into(),
        }
    }

    pub fn spreadsheet(message: impl Into<String>) -> Self {
        Self::SpreadsheetError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::RedditApiError { .. } => ErrorCategory::Network,
            Self::CsvError(_) | Self::SpreadsheetError { .. } | Self::InputError { .. } => {
                ErrorCategory::Input
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::DatabaseError(_) | Self::XlsxError(_) => ErrorCategory::Storage,
            Self::SerializationError(_)
            | Self::ProcessingError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Processing,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Processing => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => "Check network connectivity and try again",
            Self::RedditApiError { status: 401, .. } | Self::RedditApiError { status: 403, .. } => {
                "Check REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET"
            }
            Self::RedditApiError { status: 429, .. } => {
                "Reddit is rate limiting requests; wait a minute and retry"
            }
            Self::RedditApiError { .. } => "Reddit may be unavailable; retry later",
            Self::CsvError(_) | Self::SpreadsheetError { .. } => {
                "Make sure the file is a valid CSV or XLSX spreadsheet"
            }
            Self::InputError { .. } => {
                "Provide a spreadsheet with a 'comment_url' column of Reddit comment links"
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Review the configuration file and environment",
            Self::DatabaseError(_) => "Check that the tracking database path is writable",
            Self::XlsxError(_) | Self::IoError(_) => "Check file permissions and free disk space",
            Self::SerializationError(_) | Self::ProcessingError { .. } => {
                "Run again with --verbose for details"
            }
            Self::ValidationError { .. } => "Correct the invalid value and retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) if e.is_timeout() => "The request timed out".to_string(),
            Self::ApiError(_) => "Could not reach the remote server".to_string(),
            Self::RedditApiError { status, .. } => {
                format!("Reddit rejected the request (HTTP {})", status)
            }
            Self::InputError { message } | Self::SpreadsheetError { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// CLI 退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories_and_exit_codes() {
        let input = TrackerError::input("no comment_url column");
        assert_eq!(input.category(), ErrorCategory::Input);
        assert_eq!(input.exit_code(), 1);
        assert_eq!(input.user_friendly_message(), "no comment_url column");

        let api = TrackerError::RedditApiError {
            status: 429,
            message: "Too Many Requests".to_string(),
        };
        assert_eq!(api.severity(), ErrorSeverity::Medium);
        assert_eq!(api.exit_code(), 2);
        assert!(api.recovery_suggestion().contains("rate limiting"));

        let io = TrackerError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(io.severity(), ErrorSeverity::Critical);
        assert_eq!(io.exit_code(), 3);
    }
}
