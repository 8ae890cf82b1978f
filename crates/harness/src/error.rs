//! Error types for the harness runtime
//!
//! Transport and HTTP failures never show up here: the resource clients fold
//! them into [`crate::api::ApiResult::Failure`]. These errors are for the
//! harness itself (assertions, configuration, missing fixtures).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Expected status {expected} but got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    #[error("No response or error was recorded")]
    NothingRecorded,

    #[error("{schema} schema violated:\n  {}", violations.join("\n  "))]
    SchemaViolation {
        schema: String,
        violations: Vec<String>,
    },

    #[error("Missing fixture: {0}")]
    MissingFixture(String),

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
