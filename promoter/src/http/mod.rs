//! HTTP plumbing for the graduation API

pub mod client;
pub mod deployments;

pub use client::{ApiError, AuthScheme, HttpClient};
pub use deployments::{ApiConnector, ApiPaths, DeploymentApi, HttpConnector, HttpDeploymentApi};
