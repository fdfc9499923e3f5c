//! Deployment client adapter
//!
//! Typed wrapper over a [`DeploymentApi`] that presents the run's token on
//! every call and turns wire failures into run errors.

use std::sync::Arc;

use graduation_api::TriggerRequest;
use thiserror::Error;
use tracing::{debug, info};

use crate::authn::ResolvedIdentity;
use crate::errors::PromoteError;
use crate::http::DeploymentApi;
use crate::models::{DeploymentHandle, DeploymentStatus};
use crate::registry::EnvironmentSpec;

/// Failure of one status query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StatusQueryError {
    pub message: String,
    pub transient: bool,
}

impl From<StatusQueryError> for PromoteError {
    fn from(err: StatusQueryError) -> Self {
        PromoteError::StatusQuery(err.message)
    }
}

/// Deployment calls made on behalf of one resolved identity
pub struct DeploymentClient {
    api: Arc<dyn DeploymentApi>,
    identity: ResolvedIdentity,
}

impl DeploymentClient {
    pub fn new(api: Arc<dyn DeploymentApi>, identity: ResolvedIdentity) -> Self {
        Self { api, identity }
    }

    /// Start the deployment. Called at most once per run; never retried.
    pub async fn trigger(
        &self,
        source: &str,
        destination: &EnvironmentSpec,
    ) -> Result<DeploymentHandle, PromoteError> {
        let request = TriggerRequest {
            source: source.to_string(),
            destination: destination.target_suffix().to_string(),
        };
        debug!(
            "Triggering graduation of '{}' to '{}' ({})",
            request.source,
            destination.id(),
            request.destination
        );

        let response = self
            .api
            .trigger(self.identity.token(), &request)
            .await
            .map_err(|e| PromoteError::Trigger(self.identity.redact(&e.to_string())))?;

        let deployment_id = response.deployment_id.trim();
        if !is_valid_deployment_id(deployment_id) {
            return Err(PromoteError::Trigger(format!(
                "API returned an unusable deployment id '{}'",
                self.identity.redact(deployment_id)
            )));
        }

        let handle = DeploymentHandle::new(deployment_id);
        info!(
            "Deployment {} started for '{}' -> '{}'",
            handle.deployment_id,
            source,
            destination.id()
        );
        Ok(handle)
    }

    /// Read the current status. Safe to retry.
    pub async fn status(
        &self,
        handle: &DeploymentHandle,
    ) -> Result<DeploymentStatus, StatusQueryError> {
        self.api
            .status(self.identity.token(), &handle.deployment_id)
            .await
            .map(|response| {
                let status = DeploymentStatus::from(response);
                match status {
                    DeploymentStatus::Failed { reason } => DeploymentStatus::Failed {
                        reason: self.identity.redact(&reason),
                    },
                    other => other,
                }
            })
            .map_err(|e| StatusQueryError {
                transient: e.is_transient(),
                message: self.identity.redact(&e.to_string()),
            })
    }
}

fn is_valid_deployment_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}
