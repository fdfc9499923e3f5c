//! End-to-end runs against scripted collaborators

use std::sync::atomic::Ordering;
use std::time::Duration;

use promoter::deploy::Clock;
use promoter::errors::PromoteError;
use promoter::models::RunRequest;
use promoter::report::PollObservation;
use tokio_test::{assert_err, assert_ok};

use crate::support::{
    harness, harness_with_api, settings, FakeProvider, ScriptedApi, Step, NONPROD_URL, PROD_URL,
    TOKEN,
};

fn never() -> futures::future::Pending<()> {
    futures::future::pending()
}

fn qa_provider() -> FakeProvider {
    FakeProvider::default().with("svc-qa-billing", TOKEN, NONPROD_URL)
}

#[tokio::test]
async fn test_scenario_a_qa_promotion_succeeds() {
    let h = harness(
        qa_provider(),
        vec![
            Step::Running("queued"),
            Step::Running("deploying"),
            Step::Succeeded,
        ],
        settings(3, 30, 3),
    );
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let report = assert_ok!(h.orchestrator.run(request, never()).await);

    assert_eq!(report.deployment_id, "dep-001");
    assert_eq!(report.polls, 3);
    assert_eq!(report.elapsed, Duration::from_secs(6));
    assert_eq!(h.api.trigger_calls(), 1);
    assert_eq!(h.api.status_calls(), 3);
    assert_eq!(*h.api.destinations_seen.lock().unwrap(), vec!["QA".to_string()]);
    assert!(h.api.tokens_seen.lock().unwrap().iter().all(|t| t == TOKEN));

    let progress = h.reporter.progress.lock().unwrap();
    assert_eq!(progress.len(), 3);
    assert_eq!(
        progress[1].observation,
        PollObservation::Status(promoter::models::DeploymentStatus::Running {
            detail: Some("deploying".to_string())
        })
    );
    assert_eq!(*h.reporter.finished.lock().unwrap(), vec!["succeeded dep-001"]);
}

#[tokio::test]
async fn test_scenario_b_prod_destination_with_qa_url_fails_fast() {
    let provider = FakeProvider::default().with("svc-prod-billing", TOKEN, NONPROD_URL);
    let h = harness(provider, vec![Step::Succeeded], settings(3, 30, 3));
    let request = RunRequest::new("billing-api", "prod", "svc-prod-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);

    assert!(matches!(err, PromoteError::InconsistentEnvironment(_)));
    assert_ne!(err.exit_code(), 0);
    assert_eq!(h.connector.connects.load(Ordering::SeqCst), 0);
    assert_eq!(h.api.trigger_calls(), 0);
    assert_eq!(h.api.status_calls(), 0);
    assert_eq!(h.reporter.finished.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_scenario_c_transient_failures_escalate_to_unknown() {
    let h = harness(
        qa_provider(),
        vec![
            Step::Transient("gateway timeout"),
            Step::Transient("gateway timeout"),
            Step::Transient("gateway timeout"),
            Step::Succeeded,
        ],
        settings(3, 300, 3),
    );
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);

    assert!(matches!(err, PromoteError::Unknown { .. }), "{err}");
    assert_ne!(err.exit_code(), 0);
    assert_eq!(h.api.trigger_calls(), 1);
    assert_eq!(h.api.status_calls(), 3);
}

#[tokio::test]
async fn test_scenario_d_never_terminal_times_out() {
    let h = harness(qa_provider(), vec![Step::Running("waiting")], settings(3, 30, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);

    match &err {
        PromoteError::TimedOut {
            polls,
            elapsed_secs,
            ..
        } => {
            assert_eq!(*polls, 10);
            assert_eq!(*elapsed_secs, 30);
        }
        other => panic!("expected timeout, got {other}"),
    }
    assert_ne!(err.exit_code(), 0);
    assert_eq!(h.api.status_calls(), 10);
    assert_eq!(h.clock.now(), Duration::from_secs(30));
}

#[tokio::test]
async fn test_success_on_nth_poll_records_n_iterations() {
    for n in 1..=6usize {
        let mut steps = vec![Step::Running("working"); n - 1];
        steps.push(Step::Succeeded);
        let h = harness(qa_provider(), steps, settings(3, 600, 3));
        let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

        let report = assert_ok!(h.orchestrator.run(request, never()).await);
        assert_eq!(report.polls as usize, n);
        assert_eq!(h.api.status_calls(), n);
    }
}

#[tokio::test]
async fn test_running_polls_have_increasing_elapsed_time() {
    let h = harness(qa_provider(), vec![Step::Running("working")], settings(3, 60, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();
    let _ = h.orchestrator.run(request, never()).await;

    let progress = h.reporter.progress.lock().unwrap();
    assert!(progress.len() > 2);
    for pair in progress.windows(2) {
        assert!(pair[1].elapsed > pair[0].elapsed);
        assert_eq!(pair[1].iteration, pair[0].iteration + 1);
    }
}

#[tokio::test]
async fn test_status_calls_never_overlap() {
    let mut steps = vec![Step::Running("working"); 8];
    steps.push(Step::Succeeded);
    let h = harness(qa_provider(), steps, settings(3, 600, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    assert_ok!(h.orchestrator.run(request, never()).await);
    assert_eq!(h.api.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remote_failure_is_terminal() {
    let h = harness(
        qa_provider(),
        vec![Step::Running("working"), Step::Failed("smoke tests failed")],
        settings(3, 600, 3),
    );
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);
    match err {
        PromoteError::DeploymentFailed {
            deployment_id,
            reason,
        } => {
            assert_eq!(deployment_id, "dep-001");
            assert_eq!(reason, "smoke tests failed");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.api.status_calls(), 2);
}

#[tokio::test]
async fn test_trigger_error_is_not_retried() {
    let api = ScriptedApi::new(vec![Step::Succeeded]).failing_trigger(503, "busy");
    let h = harness_with_api(qa_provider(), api, settings(3, 600, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);
    assert!(matches!(err, PromoteError::Trigger(_)));
    assert_eq!(h.api.trigger_calls(), 1);
    assert_eq!(h.api.status_calls(), 0);
}

#[tokio::test]
async fn test_token_never_appears_in_errors_or_progress() {
    let echo = Box::leak(format!("invalid credentials {}", TOKEN).into_boxed_str());
    let h = harness(
        qa_provider(),
        vec![Step::Transient(echo), Step::Permanent(echo)],
        settings(3, 600, 3),
    );
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);
    assert!(!err.to_string().contains(TOKEN));

    for entry in h.reporter.progress.lock().unwrap().iter() {
        assert!(!format!("{:?}", entry).contains(TOKEN));
    }
    for line in h.reporter.finished.lock().unwrap().iter() {
        assert!(!line.contains(TOKEN));
    }
}

#[tokio::test]
async fn test_trigger_error_body_is_redacted() {
    let api = ScriptedApi::new(vec![]).failing_trigger(401, &format!("rejected {}", TOKEN));
    let h = harness_with_api(qa_provider(), api, settings(3, 600, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);
    assert!(err.to_string().contains("[REDACTED]"));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_permanent_status_error_is_unknown_immediately() {
    let h = harness(
        qa_provider(),
        vec![Step::Permanent("deployment not found")],
        settings(3, 600, 3),
    );
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);
    assert!(matches!(err, PromoteError::Unknown { .. }));
    assert_eq!(h.api.status_calls(), 1);
}

#[tokio::test]
async fn test_recovery_after_transient_failures() {
    let h = harness(
        qa_provider(),
        vec![
            Step::Transient("reset"),
            Step::Transient("reset"),
            Step::Running("working"),
            Step::Transient("reset"),
            Step::Succeeded,
        ],
        settings(3, 600, 3),
    );
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let report = assert_ok!(h.orchestrator.run(request, never()).await);
    assert_eq!(report.polls, 5);
}

#[tokio::test]
async fn test_cancellation_stops_local_supervision() {
    let h = harness(qa_provider(), vec![Step::Running("working")], settings(3, 600, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, async {}).await);
    assert!(matches!(err, PromoteError::Cancelled { .. }));
    assert_eq!(err.exit_code(), 130);
    assert_eq!(h.api.trigger_calls(), 1);
    assert_eq!(h.api.status_calls(), 1);
}

#[tokio::test]
async fn test_unknown_connection_fails_before_any_call() {
    let h = harness(FakeProvider::default(), vec![Step::Succeeded], settings(3, 30, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);
    assert!(matches!(err, PromoteError::CredentialResolution { .. }));
    assert_eq!(h.api.trigger_calls(), 0);
}

#[tokio::test]
async fn test_preprod_with_qa_connection_is_rejected() {
    // QA and pre-production share a URL; the connection must still match
    let h = harness(qa_provider(), vec![Step::Succeeded], settings(3, 30, 3));
    let request = RunRequest::new("billing-api", "pp", "svc-qa-billing").unwrap();

    let err = assert_err!(h.orchestrator.run(request, never()).await);
    assert!(matches!(err, PromoteError::InconsistentEnvironment(_)));
    assert_eq!(h.api.trigger_calls(), 0);
}

#[tokio::test]
async fn test_prod_promotion_uses_prod_identity() {
    let provider = FakeProvider::default().with("svc-prod-billing", TOKEN, PROD_URL);
    let h = harness(provider, vec![Step::Succeeded], settings(3, 30, 3));
    let request = RunRequest::new("billing-api", "prod", "svc-prod-billing").unwrap();

    let report = assert_ok!(h.orchestrator.run(request, never()).await);
    assert_eq!(report.polls, 1);
    assert_eq!(*h.api.destinations_seen.lock().unwrap(), vec!["PROD".to_string()]);
}

#[tokio::test]
async fn test_preflight_makes_no_deployment_calls() {
    let h = harness(qa_provider(), vec![Step::Succeeded], settings(3, 30, 3));
    let request = RunRequest::new("billing-api", "qa", "svc-qa-billing").unwrap();

    let (identity, destination) = assert_ok!(h.orchestrator.preflight(&request).await);
    assert_eq!(identity.connection_name(), "svc-qa-billing");
    assert_eq!(destination.as_str(), "qa");
    assert_eq!(h.connector.connects.load(Ordering::SeqCst), 0);
    assert_eq!(h.api.trigger_calls(), 0);
}
