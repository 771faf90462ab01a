//! Error types for notecheck

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model artifact could not be loaded. Callers degrade to fallback mode.
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Input bytes are not a decodable image. No record is produced.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    /// A single audit log row failed to parse.
    #[error("Corrupt audit log row {row}: {reason}")]
    LogCorruption { row: u64, reason: String },

    #[error("Report write error: {0}")]
    ReportWrite(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
