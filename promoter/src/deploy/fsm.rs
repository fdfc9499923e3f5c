//! Finite State Machine for deployment supervision

use serde::{Deserialize, Serialize};

use crate::models::DeploymentStatus;

/// Supervision state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// Trigger accepted, polling not yet started
    Triggered,

    /// Waiting for the remote deployment to finish
    Polling,

    /// Remote reported success
    Succeeded,

    /// Remote reported failure
    Failed,

    /// Local deadline passed
    TimedOut,

    /// Status could not be determined
    Unknown,
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SupervisorState::Triggered | SupervisorState::Polling)
    }
}

/// Supervision event
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// Begin polling
    StartPolling,

    /// A status query returned
    Observed(DeploymentStatus),

    /// A status query failed
    QueryFailed { message: String, transient: bool },

    /// Elapsed time reached the ceiling
    DeadlineExceeded,
}

/// Supervision FSM.
///
/// Counts every status query as one poll and tracks the run of consecutive
/// failed or unreadable polls; only the latest status is kept.
#[derive(Debug, Clone)]
pub struct SupervisorFsm {
    state: SupervisorState,
    reason: Option<String>,
    polls: u32,
    consecutive_failures: u32,
    max_consecutive_failures: u32,
    last_status: Option<DeploymentStatus>,
}

impl SupervisorFsm {
    /// Create a new FSM in triggered state
    pub fn new(max_consecutive_failures: u32) -> Self {
        Self {
            state: SupervisorState::Triggered,
            reason: None,
            polls: 0,
            consecutive_failures: 0,
            max_consecutive_failures: max_consecutive_failures.max(1),
            last_status: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Failure, timeout or escalation reason if any
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Status queries issued so far
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_status(&self) -> Option<&DeploymentStatus> {
        self.last_status.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: SupervisorEvent) -> Result<(), String> {
        let new_state = match (self.state, event) {
            (SupervisorState::Triggered, SupervisorEvent::StartPolling) => SupervisorState::Polling,

            (SupervisorState::Polling, SupervisorEvent::Observed(status)) => {
                self.polls += 1;
                let next = match &status {
                    DeploymentStatus::Running { .. } => {
                        self.consecutive_failures = 0;
                        SupervisorState::Polling
                    }
                    DeploymentStatus::Succeeded { .. } => {
                        self.consecutive_failures = 0;
                        SupervisorState::Succeeded
                    }
                    DeploymentStatus::Failed { reason } => {
                        self.reason = Some(reason.clone());
                        SupervisorState::Failed
                    }
                    DeploymentStatus::Unknown { detail } => {
                        let message = match detail {
                            Some(detail) => format!("unrecognized remote state ({})", detail),
                            None => "unrecognized remote state".to_string(),
                        };
                        self.record_failure(message, true)
                    }
                };
                self.last_status = Some(status);
                next
            }

            (SupervisorState::Polling, SupervisorEvent::QueryFailed { message, transient }) => {
                self.polls += 1;
                self.record_failure(message, transient)
            }

            (SupervisorState::Polling, SupervisorEvent::DeadlineExceeded) => {
                self.reason = Some(format!("no terminal state after {} polls", self.polls));
                SupervisorState::TimedOut
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }

    fn record_failure(&mut self, message: String, transient: bool) -> SupervisorState {
        self.consecutive_failures += 1;
        let exhausted = self.consecutive_failures >= self.max_consecutive_failures;
        if !transient || exhausted {
            self.reason = Some(if transient {
                format!(
                    "{} consecutive status failures, last: {}",
                    self.consecutive_failures, message
                )
            } else {
                message
            });
            SupervisorState::Unknown
        } else {
            SupervisorState::Polling
        }
    }
}
