use thiserror::Error;

#[derive(Error, Debug)]
pub enum NestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

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

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Invalid mapping definition '{root_name}': {reason}")]
    InvalidMapping { root_name: String, reason: String },

    #[error("Duplicate rootName '{root_name}' among sibling mapping definitions")]
    DuplicateRootName { root_name: String },

    #[error("Key '{key}' would be written twice into entries of '{group}'")]
    KeyCollision { key: String, group: String },

    #[error(
        "Collected field '{field}' disagrees within group '{group}': '{first}' vs '{conflicting}'"
    )]
    CollectionConflict {
        field: String,
        group: String,
        first: String,
        conflicting: String,
    },

    #[error("Malformed query result: {message}")]
    MalformedResult { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Mapping,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NestError::IoError(_) => ErrorCategory::Io,
            NestError::ConfigError { .. }
            | NestError::ConfigValidationError { .. }
            | NestError::InvalidConfigValueError { .. }
            | NestError::MissingConfigError { .. } => ErrorCategory::Configuration,
            NestError::InvalidMapping { .. }
            | NestError::DuplicateRootName { .. }
            | NestError::KeyCollision { .. } => ErrorCategory::Mapping,
            NestError::CsvError(_)
            | NestError::SerializationError(_)
            | NestError::CollectionConflict { .. }
            | NestError::MalformedResult { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Critical,
            ErrorCategory::Configuration | ErrorCategory::Mapping => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::Medium,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            NestError::IoError(_) => "檢查檔案路徑與讀寫權限".to_string(),
            NestError::CsvError(_) => {
                "Make sure the input is a SPARQL CSV result with a header row".to_string()
            }
            NestError::SerializationError(_) | NestError::MalformedResult { .. } => {
                "Make sure the input is a SPARQL SELECT result (head/results/bindings)".to_string()
            }
            NestError::ConfigError { .. } | NestError::ConfigValidationError { .. } => {
                "檢查 TOML 配置檔的語法與必要欄位".to_string()
            }
            NestError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the configuration", field)
            }
            NestError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration", field)
            }
            NestError::InvalidMapping { .. } => {
                "Every grouped mapping needs rootName, propertyToGroup and name".to_string()
            }
            NestError::DuplicateRootName { root_name } => {
                format!("Rename one of the sibling mappings called '{}'", root_name)
            }
            NestError::KeyCollision { key, .. } => format!(
                "Rename the mapping name, collected field or child rootName '{}'",
                key
            ),
            NestError::CollectionConflict { field, .. } => format!(
                "Remove '{}' from toCollect or disable strict_collection",
                field
            ),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("無法讀取或寫入檔案: {}", self),
            ErrorCategory::Configuration => format!("配置錯誤: {}", self),
            ErrorCategory::Mapping => format!("Mapping definition error: {}", self),
            ErrorCategory::Data => format!("Conversion failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, NestError>;
