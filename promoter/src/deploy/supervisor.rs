//! Polling supervisor

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::deploy::adapter::DeploymentClient;
use crate::deploy::clock::Clock;
use crate::deploy::fsm::{SupervisorEvent, SupervisorFsm, SupervisorState};
use crate::errors::PromoteError;
use crate::models::DeploymentHandle;
use crate::report::{PollObservation, PollProgress, Reporter};
use crate::utils::{calc_exp_backoff, CooldownOptions};

/// Supervisor settings
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Wait between polls while the deployment is running
    pub poll_interval: Duration,

    /// Ceiling on time spent supervising one deployment
    pub timeout: Duration,

    /// Consecutive failed status queries tolerated before giving up
    pub max_status_failures: u32,

    /// Growth factor of the wait after consecutive failures
    pub backoff_multiplier: f64,

    /// Upper bound on the wait after a failure
    pub max_backoff: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            timeout: Duration::from_secs(1800),
            max_status_failures: 3,
            backoff_multiplier: 1.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl SupervisorSettings {
    fn failure_cooldown(&self) -> CooldownOptions {
        CooldownOptions {
            base_delay: self.poll_interval,
            max_delay: self.max_backoff.max(self.poll_interval),
            multiplier: self.backoff_multiplier,
        }
    }
}

/// Terminal result of supervising one deployment
#[derive(Debug, Clone)]
pub struct SupervisionOutcome {
    pub state: SupervisorState,
    pub polls: u32,
    pub elapsed: Duration,
    pub reason: Option<String>,
}

impl SupervisionOutcome {
    /// Map a non-success terminal state to its run error
    pub fn into_result(self, deployment_id: &str) -> Result<Self, PromoteError> {
        let reason = self
            .reason
            .clone()
            .unwrap_or_else(|| "no reason recorded".to_string());
        match self.state {
            SupervisorState::Succeeded => Ok(self),
            SupervisorState::Failed => Err(PromoteError::DeploymentFailed {
                deployment_id: deployment_id.to_string(),
                reason,
            }),
            SupervisorState::TimedOut => Err(PromoteError::TimedOut {
                deployment_id: deployment_id.to_string(),
                elapsed_secs: self.elapsed.as_secs(),
                polls: self.polls,
            }),
            SupervisorState::Unknown => Err(PromoteError::Unknown {
                deployment_id: deployment_id.to_string(),
                reason,
            }),
            state => Err(PromoteError::Internal(format!(
                "supervision ended in non-terminal state {:?}",
                state
            ))),
        }
    }
}

/// Drives the poll loop for one deployment until a terminal state
pub struct PollingSupervisor<'a> {
    client: &'a DeploymentClient,
    clock: Arc<dyn Clock>,
    settings: SupervisorSettings,
    reporter: &'a dyn Reporter,
}

impl<'a> PollingSupervisor<'a> {
    pub fn new(
        client: &'a DeploymentClient,
        clock: Arc<dyn Clock>,
        settings: SupervisorSettings,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            client,
            clock,
            settings,
            reporter,
        }
    }

    /// Poll `handle` until it reaches a terminal state.
    ///
    /// `cancel` is only observed while waiting between polls. Cancelling
    /// stops local supervision; the remote deployment is left untouched.
    pub async fn supervise<C>(
        &self,
        handle: &DeploymentHandle,
        cancel: C,
    ) -> Result<SupervisionOutcome, PromoteError>
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let start = self.clock.now();
        let cooldown = self.settings.failure_cooldown();
        let mut fsm = SupervisorFsm::new(self.settings.max_status_failures);
        fsm.process(SupervisorEvent::StartPolling)
            .map_err(PromoteError::Internal)?;

        debug!(
            "Supervising deployment {} (interval {:?}, timeout {:?})",
            handle.deployment_id, self.settings.poll_interval, self.settings.timeout
        );

        loop {
            let result = self.client.status(handle).await;
            let elapsed = self.clock.now().saturating_sub(start);

            let (event, observation) = match result {
                Ok(status) => (
                    SupervisorEvent::Observed(status.clone()),
                    PollObservation::Status(status),
                ),
                Err(e) => (
                    SupervisorEvent::QueryFailed {
                        message: e.message.clone(),
                        transient: e.transient,
                    },
                    PollObservation::QueryFailed {
                        message: e.message,
                        consecutive: fsm.consecutive_failures() + 1,
                    },
                ),
            };
            fsm.process(event).map_err(PromoteError::Internal)?;

            self.reporter.progress(&PollProgress {
                deployment_id: handle.deployment_id.clone(),
                iteration: fsm.polls(),
                elapsed,
                observation,
            });

            if fsm.is_terminal() {
                break;
            }

            if elapsed >= self.settings.timeout {
                fsm.process(SupervisorEvent::DeadlineExceeded)
                    .map_err(PromoteError::Internal)?;
                break;
            }

            let delay = match fsm.consecutive_failures() {
                0 => self.settings.poll_interval,
                n => calc_exp_backoff(&cooldown, n - 1),
            };
            let delay = delay.min(self.settings.timeout - elapsed);

            tokio::select! {
                _ = &mut cancel => {
                    warn!(
                        "Supervision of deployment {} cancelled after {} polls; remote deployment left running",
                        handle.deployment_id,
                        fsm.polls()
                    );
                    return Err(PromoteError::Cancelled {
                        deployment_id: handle.deployment_id.clone(),
                    });
                }
                _ = self.clock.sleep(delay) => {}
            }

            if self.clock.now().saturating_sub(start) >= self.settings.timeout {
                fsm.process(SupervisorEvent::DeadlineExceeded)
                    .map_err(PromoteError::Internal)?;
                break;
            }
        }

        let outcome = SupervisionOutcome {
            state: fsm.state(),
            polls: fsm.polls(),
            elapsed: self.clock.now().saturating_sub(start),
            reason: fsm.reason().map(str::to_string),
        };

        match outcome.state {
            SupervisorState::Succeeded => info!(
                "Deployment {} succeeded after {} polls",
                handle.deployment_id, outcome.polls
            ),
            SupervisorState::TimedOut => warn!(
                "Deployment {} timed out after {:?} ({} polls, last seen {})",
                handle.deployment_id,
                outcome.elapsed,
                outcome.polls,
                fsm.last_status().map(|s| s.label()).unwrap_or("nothing")
            ),
            state => warn!(
                "Deployment {} ended as {:?}: {}",
                handle.deployment_id,
                state,
                outcome.reason.as_deref().unwrap_or("")
            ),
        }

        Ok(outcome)
    }
}
