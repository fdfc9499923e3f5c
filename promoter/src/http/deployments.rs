//! Deployment API client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graduation_api::{StatusResponse, TriggerRequest, TriggerResponse};
use secrecy::SecretString;

use crate::authn::ResolvedIdentity;
use crate::errors::PromoteError;
use crate::http::client::{ApiError, AuthScheme, HttpClient};

/// Remote graduation API: start a deployment and read its status
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Start a deployment. Not safe to retry.
    async fn trigger(
        &self,
        token: &SecretString,
        request: &TriggerRequest,
    ) -> Result<TriggerResponse, ApiError>;

    /// Read the status of a deployment. Read-only.
    async fn status(
        &self,
        token: &SecretString,
        deployment_id: &str,
    ) -> Result<StatusResponse, ApiError>;
}

/// Builds a [`DeploymentApi`] bound to a resolved identity's endpoint
pub trait ApiConnector: Send + Sync {
    fn connect(&self, identity: &ResolvedIdentity) -> Result<Arc<dyn DeploymentApi>, PromoteError>;
}

/// Endpoint paths, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPaths {
    pub trigger: String,

    /// Must contain `{id}`
    pub status: String,
}

impl Default for ApiPaths {
    fn default() -> Self {
        Self {
            trigger: "/deployments".to_string(),
            status: "/deployments/{id}".to_string(),
        }
    }
}

impl ApiPaths {
    pub fn status_path(&self, deployment_id: &str) -> String {
        self.status.replace("{id}", deployment_id)
    }
}

/// reqwest-backed graduation API
pub struct HttpDeploymentApi {
    client: HttpClient,
    paths: ApiPaths,
}

impl HttpDeploymentApi {
    pub fn new(client: HttpClient, paths: ApiPaths) -> Self {
        Self { client, paths }
    }
}

#[async_trait]
impl DeploymentApi for HttpDeploymentApi {
    async fn trigger(
        &self,
        token: &SecretString,
        request: &TriggerRequest,
    ) -> Result<TriggerResponse, ApiError> {
        self.client.post(&self.paths.trigger, token, request).await
    }

    async fn status(
        &self,
        token: &SecretString,
        deployment_id: &str,
    ) -> Result<StatusResponse, ApiError> {
        let path = self.paths.status_path(deployment_id);
        self.client.get(&path, token).await
    }
}

/// Connects to the graduation API over HTTPS
#[derive(Debug, Clone)]
pub struct HttpConnector {
    pub request_timeout: Duration,
    pub auth_scheme: AuthScheme,
    pub paths: ApiPaths,
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            auth_scheme: AuthScheme::Bearer,
            paths: ApiPaths::default(),
        }
    }
}

impl ApiConnector for HttpConnector {
    fn connect(&self, identity: &ResolvedIdentity) -> Result<Arc<dyn DeploymentApi>, PromoteError> {
        let client = HttpClient::new(identity.base_url(), self.request_timeout, self.auth_scheme)
            .map_err(|e| PromoteError::Internal(format!("building HTTP client: {}", e)))?;
        Ok(Arc::new(HttpDeploymentApi::new(client, self.paths.clone())))
    }
}
