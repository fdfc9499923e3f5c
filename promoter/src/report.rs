//! Progress and final status reporting

use std::time::Duration;

use tracing::{error, info, warn};

use crate::errors::PromoteError;
use crate::models::{DeploymentStatus, RunReport};

/// What one poll iteration saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollObservation {
    Status(DeploymentStatus),
    QueryFailed { message: String, consecutive: u32 },
}

/// One poll iteration
#[derive(Debug, Clone)]
pub struct PollProgress {
    pub deployment_id: String,
    pub iteration: u32,
    pub elapsed: Duration,
    pub observation: PollObservation,
}

/// Sink for human-readable progress and the final status of a run
pub trait Reporter: Send + Sync {
    fn progress(&self, progress: &PollProgress);

    /// Called exactly once per run
    fn finished(&self, result: &Result<RunReport, PromoteError>);
}

/// Writes progress and final status through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn progress(&self, progress: &PollProgress) {
        let elapsed_secs = progress.elapsed.as_secs();
        match &progress.observation {
            PollObservation::Status(status) => info!(
                deployment_id = %progress.deployment_id,
                iteration = progress.iteration,
                elapsed_secs,
                state = status.label(),
                detail = status.detail().unwrap_or(""),
                "Deployment status"
            ),
            PollObservation::QueryFailed {
                message,
                consecutive,
            } => warn!(
                deployment_id = %progress.deployment_id,
                iteration = progress.iteration,
                elapsed_secs,
                consecutive_failures = consecutive,
                "Status query failed: {}",
                message
            ),
        }
    }

    fn finished(&self, result: &Result<RunReport, PromoteError>) {
        match result {
            Ok(report) => info!(
                run_id = %report.run_id,
                deployment_id = %report.deployment_id,
                destination = %report.destination,
                polls = report.polls,
                elapsed_secs = report.elapsed.as_secs(),
                "Promotion of '{}' succeeded",
                report.source
            ),
            Err(err) => error!(
                kind = err.kind(),
                exit_code = err.exit_code(),
                "Promotion failed: {}",
                err
            ),
        }
    }
}
