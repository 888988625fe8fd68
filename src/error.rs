//! Library error types
//!
//! Test outcomes never travel through these errors; they only cover the
//! ambient surfaces around the scheduler (configuration and output).

use thiserror::Error;

/// Errors raised outside of test execution
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Unknown log level: {0}")]
    UnknownLogLevel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
