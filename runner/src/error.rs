//! Error types for configuration, step execution and scenario loading

use thiserror::Error;

/// Errors raised while validating configuration or building a runner.
///
/// These are fatal at startup; nothing after a successful construction
/// produces one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Host must not be empty")]
    EmptyHost,

    #[error("Invalid host URL {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("Timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(String),

    #[error("Invalid think time: min {min:?} exceeds max {max:?}")]
    InvalidThinkTime {
        min: std::time::Duration,
        max: std::time::Duration,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Reasons a single step is classified as a failure.
///
/// Always recovered into a failed `StepResult`, never propagated.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Status: {status}, Response: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl StepError {
    /// HTTP status code carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            StepError::UnexpectedStatus { status, .. } => Some(*status),
            StepError::Timeout(_) | StepError::Transport(_) => None,
        }
    }
}

/// Errors loading a scenario definition from disk
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate step name: {0}")]
    DuplicateStep(String),
}
