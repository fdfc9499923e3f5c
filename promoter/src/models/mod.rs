//! Run and deployment models

pub mod deployment;
pub mod run;

pub use deployment::{DeploymentHandle, DeploymentStatus, RunReport};
pub use run::RunRequest;
