use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: record '{record}' is missing required columns: {}", missing.join(", "))]
    Validation { record: String, missing: Vec<String> },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Type error: column '{column}' expected {expected}, got {found}")]
    Type {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown column: {record}.{column}")]
    UnknownColumn { record: String, column: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrmError {
    /// The missing column names carried by a validation failure.
    pub fn missing_columns(&self) -> Option<&[String]> {
        match self {
            OrmError::Validation { missing, .. } => Some(missing),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;
