use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventflowError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Cannot parse stage '{input}': {reason}")]
    StageParseError { input: String, reason: String },

    #[error("Deferred computation rejected: {reason}")]
    DeferredRejected { reason: String },

    #[error("Computation failed at {stage}: {details}")]
    ComputationFailed { stage: String, details: String },

    #[error("Subscriber '{subscriber}' did not complete within {ticks} ticks")]
    DeadlineExceeded { subscriber: String, ticks: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Io,
    Computation,
    Timing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EventflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EventflowError::ConfigError { .. }
            | EventflowError::ConfigValidationError { .. }
            | EventflowError::InvalidConfigValueError { .. }
            | EventflowError::MissingConfigError { .. }
            | EventflowError::StageParseError { .. } => ErrorCategory::Configuration,
            EventflowError::IoError(_) | EventflowError::SerializationError(_) => {
                ErrorCategory::Io
            }
            EventflowError::DeferredRejected { .. } | EventflowError::ComputationFailed { .. } => {
                ErrorCategory::Computation
            }
            EventflowError::DeadlineExceeded { .. } => ErrorCategory::Timing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 未完成的訂閱仍會回報已收到的值
            ErrorCategory::Timing => ErrorSeverity::Low,
            ErrorCategory::Computation => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EventflowError::IoError(_) => {
                "Check that the file exists and is readable".to_string()
            }
            EventflowError::SerializationError(_) => {
                "Check that the report contains only serializable values".to_string()
            }
            EventflowError::ConfigError { .. } | EventflowError::ConfigValidationError { .. } => {
                "Check the TOML syntax and the [stream] / [[subscribers]] sections".to_string()
            }
            EventflowError::InvalidConfigValueError { field, .. } => {
                format!("Adjust the value of '{}'", field)
            }
            EventflowError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration", field)
            }
            EventflowError::StageParseError { .. } => {
                "Use the form take:N, filter:even, map:square or scan:add:0".to_string()
            }
            EventflowError::DeferredRejected { .. } => {
                "Handle the rejection or provide a fallback value".to_string()
            }
            EventflowError::ComputationFailed { stage, .. } => {
                format!("Inspect the inputs handed to '{}'", stage)
            }
            EventflowError::DeadlineExceeded { .. } => {
                "Add a take stage or raise stream.max_ticks".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Io => format!("Could not read or write data: {}", self),
            ErrorCategory::Computation => format!("A computation failed: {}", self),
            ErrorCategory::Timing => format!("The stream ran out of time: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EventflowError>;
