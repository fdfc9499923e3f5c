//! API models

use serde::{Deserialize, Serialize};

/// Graduation trigger request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Deployable unit being promoted
    pub source: String,

    /// API-side name of the destination tier
    pub destination: String,
}

/// Graduation trigger response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResponse {
    #[serde(alias = "id", alias = "deploymentId")]
    pub deployment_id: String,
}

/// Remote deployment state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    Running,
    Succeeded,
    Failed,

    /// Any tag this client does not know about
    #[serde(other)]
    Unrecognized,
}

/// Deployment status response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: RemoteState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Best human-readable text carried by the body
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}
