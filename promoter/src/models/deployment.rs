//! Deployment models

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use graduation_api::{RemoteState, StatusResponse};
use serde::Serialize;

use crate::registry::EnvironmentId;

/// A deployment started by a successful trigger call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    pub deployment_id: String,
    pub started_at: DateTime<Utc>,
}

impl DeploymentHandle {
    pub fn new(deployment_id: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            started_at: Utc::now(),
        }
    }
}

/// Latest status reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    Running { detail: Option<String> },
    Succeeded { detail: Option<String> },
    Failed { reason: String },
    Unknown { detail: Option<String> },
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Succeeded { .. } | DeploymentStatus::Failed { .. }
        )
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            DeploymentStatus::Running { detail }
            | DeploymentStatus::Succeeded { detail }
            | DeploymentStatus::Unknown { detail } => detail.as_deref(),
            DeploymentStatus::Failed { reason } => Some(reason),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeploymentStatus::Running { .. } => "running",
            DeploymentStatus::Succeeded { .. } => "succeeded",
            DeploymentStatus::Failed { .. } => "failed",
            DeploymentStatus::Unknown { .. } => "unknown",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({})", self.label(), detail),
            None => f.write_str(self.label()),
        }
    }
}

impl From<StatusResponse> for DeploymentStatus {
    fn from(response: StatusResponse) -> Self {
        let detail = response.detail.filter(|d| !d.trim().is_empty());
        match response.state {
            RemoteState::Running => DeploymentStatus::Running { detail },
            RemoteState::Succeeded => DeploymentStatus::Succeeded { detail },
            RemoteState::Failed => DeploymentStatus::Failed {
                reason: detail.unwrap_or_else(|| "no reason reported".to_string()),
            },
            RemoteState::Unrecognized => DeploymentStatus::Unknown { detail },
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub deployment_id: String,
    pub source: String,
    pub destination: EnvironmentId,
    pub started_at: DateTime<Utc>,
    pub polls: u32,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}
