//! Promotion run: validate, trigger, poll, report

use std::future::Future;
use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::app::options::AppOptions;
use crate::authn::{IdentityResolver, ResolvedIdentity};
use crate::deploy::{Clock, DeploymentClient, PollingSupervisor, TokioClock};
use crate::errors::PromoteError;
use crate::http::ApiConnector;
use crate::models::{RunReport, RunRequest};
use crate::preflight;
use crate::registry::{EnvironmentId, EnvironmentRegistry};
use crate::report::{Reporter, TracingReporter};
use crate::utils::generate_uuid;

/// Composes the registry, resolver, API connector and supervisor.
///
/// Holds no per-run state; every run resolves its own identity and owns its
/// own deployment handle.
pub struct Orchestrator {
    registry: Arc<EnvironmentRegistry>,
    resolver: IdentityResolver,
    connector: Arc<dyn ApiConnector>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
    options: AppOptions,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<EnvironmentRegistry>,
        resolver: IdentityResolver,
        connector: Arc<dyn ApiConnector>,
        options: AppOptions,
    ) -> Self {
        Self {
            registry,
            resolver,
            connector,
            clock: Arc::new(TokioClock::new()),
            reporter: Arc::new(TracingReporter),
            options,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Resolve and validate without touching the deployment API
    pub async fn preflight(
        &self,
        request: &RunRequest,
    ) -> Result<(ResolvedIdentity, EnvironmentId), PromoteError> {
        let identity = self.resolver.resolve(request.connection_name()).await?;
        let spec = preflight::validate(&self.registry, request, &identity)?;
        let id = spec.id();
        Ok((identity, id))
    }

    /// Run one promotion to a terminal state.
    ///
    /// The final status is reported exactly once, whatever the outcome.
    pub async fn run<C>(&self, request: RunRequest, cancel: C) -> Result<RunReport, PromoteError>
    where
        C: Future<Output = ()>,
    {
        let run_id = generate_uuid();
        let span = info_span!(
            "promotion",
            run_id = %run_id,
            source = %request.source(),
            destination = %request.destination()
        );

        let result = self.execute(run_id, &request, cancel).instrument(span).await;
        self.reporter.finished(&result);
        result
    }

    async fn execute<C>(
        &self,
        run_id: String,
        request: &RunRequest,
        cancel: C,
    ) -> Result<RunReport, PromoteError>
    where
        C: Future<Output = ()>,
    {
        let identity = self.resolver.resolve(request.connection_name()).await?;
        let spec = preflight::validate(&self.registry, request, &identity)?;
        info!(
            "Pre-flight passed: connection '{}' matches destination '{}'",
            identity.connection_name(),
            spec.id()
        );

        let api = self.connector.connect(&identity)?;
        let client = DeploymentClient::new(api, identity);
        let handle = client.trigger(request.source(), spec).await?;

        let supervisor = PollingSupervisor::new(
            &client,
            self.clock.clone(),
            self.options.supervisor.clone(),
            self.reporter.as_ref(),
        );
        let outcome = supervisor
            .supervise(&handle, cancel)
            .await?
            .into_result(&handle.deployment_id)?;

        Ok(RunReport {
            run_id,
            deployment_id: handle.deployment_id,
            source: request.source().to_string(),
            destination: spec.id(),
            started_at: handle.started_at,
            polls: outcome.polls,
            elapsed: outcome.elapsed,
        })
    }
}
