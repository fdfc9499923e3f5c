//! Deployment module

pub mod adapter;
pub mod clock;
pub mod fsm;
pub mod supervisor;

pub use adapter::{DeploymentClient, StatusQueryError};
pub use clock::{Clock, ManualClock, TokioClock};
pub use fsm::{SupervisorEvent, SupervisorFsm, SupervisorState};
pub use supervisor::{PollingSupervisor, SupervisionOutcome, SupervisorSettings};
