//! FSM unit tests

use promoter::deploy::{SupervisorEvent, SupervisorFsm, SupervisorState};
use promoter::models::DeploymentStatus;

fn running(detail: &str) -> SupervisorEvent {
    SupervisorEvent::Observed(DeploymentStatus::Running {
        detail: Some(detail.to_string()),
    })
}

#[test]
fn test_fsm_initial_state() {
    let fsm = SupervisorFsm::new(3);
    assert_eq!(fsm.state(), SupervisorState::Triggered);
    assert!(fsm.reason().is_none());
    assert_eq!(fsm.polls(), 0);
    assert!(!fsm.is_terminal());
}

#[test]
fn test_fsm_success_flow() {
    let mut fsm = SupervisorFsm::new(3);

    // Triggered -> Polling
    fsm.process(SupervisorEvent::StartPolling).unwrap();
    assert_eq!(fsm.state(), SupervisorState::Polling);

    // Polling -> Polling
    fsm.process(running("copying artifacts")).unwrap();
    assert_eq!(fsm.state(), SupervisorState::Polling);
    assert_eq!(
        fsm.last_status(),
        Some(&DeploymentStatus::Running {
            detail: Some("copying artifacts".to_string())
        })
    );

    // Polling -> Succeeded
    fsm.process(SupervisorEvent::Observed(DeploymentStatus::Succeeded {
        detail: None,
    }))
    .unwrap();
    assert_eq!(fsm.state(), SupervisorState::Succeeded);
    assert_eq!(fsm.polls(), 2);
}

#[test]
fn test_fsm_running_never_regresses() {
    let mut fsm = SupervisorFsm::new(3);
    fsm.process(SupervisorEvent::StartPolling).unwrap();

    for i in 1..=20 {
        fsm.process(running("still going")).unwrap();
        assert_eq!(fsm.state(), SupervisorState::Polling);
        assert_eq!(fsm.polls(), i);
    }
}

#[test]
fn test_fsm_unrecognized_states_count_as_failures() {
    let mut fsm = SupervisorFsm::new(2);
    fsm.process(SupervisorEvent::StartPolling).unwrap();

    fsm.process(SupervisorEvent::Observed(DeploymentStatus::Unknown {
        detail: Some("queued".to_string()),
    }))
    .unwrap();
    assert_eq!(fsm.state(), SupervisorState::Polling);

    fsm.process(SupervisorEvent::Observed(DeploymentStatus::Unknown { detail: None }))
        .unwrap();
    assert_eq!(fsm.state(), SupervisorState::Unknown);
}

#[test]
fn test_fsm_invalid_transition() {
    let mut fsm = SupervisorFsm::new(3);

    // Cannot time out before polling starts
    let result = fsm.process(SupervisorEvent::DeadlineExceeded);
    assert!(result.is_err());
    assert_eq!(fsm.state(), SupervisorState::Triggered);
}

#[test]
fn test_terminal_states() {
    assert!(!SupervisorState::Triggered.is_terminal());
    assert!(!SupervisorState::Polling.is_terminal());
    assert!(SupervisorState::Succeeded.is_terminal());
    assert!(SupervisorState::Failed.is_terminal());
    assert!(SupervisorState::TimedOut.is_terminal());
    assert!(SupervisorState::Unknown.is_terminal());
}
