use thiserror::Error;

#[derive(Error, Debug)]
pub enum WordlistError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid header in {path}: {reason}")]
    InvalidHeader { path: String, reason: String },

    #[error("Translation result is empty")]
    EmptyTranslation,

    #[error("Translation task failed: {0}")]
    TaskFailed(String),

    #[error("Failed to replace output file: {0}")]
    PersistError(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, WordlistError>;
