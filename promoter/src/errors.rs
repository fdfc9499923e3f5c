//! Error types for the promoter

use thiserror::Error;

/// Main error type for a promotion run
#[derive(Error, Debug)]
pub enum PromoteError {
    #[error("Inconsistent environment: {0}")]
    InconsistentEnvironment(String),

    #[error("Credential resolution failed for connection '{connection}': {reason}")]
    CredentialResolution { connection: String, reason: String },

    #[error("Trigger error: {0}")]
    Trigger(String),

    #[error("Status query error: {0}")]
    StatusQuery(String),

    #[error("Deployment {deployment_id} failed: {reason}")]
    DeploymentFailed {
        deployment_id: String,
        reason: String,
    },

    #[error("Deployment {deployment_id} timed out after {elapsed_secs}s ({polls} polls)")]
    TimedOut {
        deployment_id: String,
        elapsed_secs: u64,
        polls: u32,
    },

    #[error("Deployment {deployment_id} outcome unknown: {reason}")]
    Unknown {
        deployment_id: String,
        reason: String,
    },

    #[error("Supervision of deployment {deployment_id} cancelled")]
    Cancelled { deployment_id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PromoteError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            PromoteError::InconsistentEnvironment(_) => "inconsistent_environment",
            PromoteError::CredentialResolution { .. } => "credential_resolution",
            PromoteError::Trigger(_) => "trigger",
            PromoteError::StatusQuery(_) => "status_query",
            PromoteError::DeploymentFailed { .. } => "deployment_failed",
            PromoteError::TimedOut { .. } => "timed_out",
            PromoteError::Unknown { .. } => "unknown",
            PromoteError::Cancelled { .. } => "cancelled",
            PromoteError::InvalidRequest(_) => "invalid_request",
            PromoteError::ConfigError(_) => "config",
            PromoteError::NotFound(_) => "not_found",
            PromoteError::IoError(_) => "io",
            PromoteError::JsonError(_) => "json",
            PromoteError::Internal(_) => "internal",
        }
    }

    /// Process exit code for this error. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            PromoteError::InvalidRequest(_) | PromoteError::ConfigError(_) => 2,
            PromoteError::InconsistentEnvironment(_) => 3,
            PromoteError::CredentialResolution { .. } => 4,
            PromoteError::Trigger(_) => 5,
            PromoteError::DeploymentFailed { .. } => 6,
            PromoteError::TimedOut { .. } => 7,
            PromoteError::Unknown { .. } | PromoteError::StatusQuery(_) => 8,
            PromoteError::Cancelled { .. } => 130,
            PromoteError::NotFound(_)
            | PromoteError::IoError(_)
            | PromoteError::JsonError(_)
            | PromoteError::Internal(_) => 1,
        }
    }
}

impl From<anyhow::Error> for PromoteError {
    fn from(err: anyhow::Error) -> Self {
        PromoteError::Internal(err.to_string())
    }
}

/// Replace every occurrence of `secret` in `text`
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "[REDACTED]")
}
