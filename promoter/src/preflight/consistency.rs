//! Environment consistency validation
//!
//! A run may only reach the deployment API when the destination, the resolved
//! base URL and the connection name all point at the same environment. Every
//! mismatch found is reported together, and the run stops here.

use tracing::{debug, error};

use crate::authn::ResolvedIdentity;
use crate::errors::PromoteError;
use crate::models::RunRequest;
use crate::registry::{EnvironmentRegistry, EnvironmentSpec};

/// Check that `identity` is coherent with the destination of `request`.
///
/// Returns the destination environment on success.
pub fn validate<'r>(
    registry: &'r EnvironmentRegistry,
    request: &RunRequest,
    identity: &ResolvedIdentity,
) -> Result<&'r EnvironmentSpec, PromoteError> {
    let destination = request.destination();
    let spec = registry.lookup(destination).map_err(|_| {
        PromoteError::InconsistentEnvironment(format!(
            "destination '{}' is not registered",
            destination
        ))
    })?;

    let mut violations = Vec::new();

    if identity.connection_name() != request.connection_name() {
        violations.push(format!(
            "resolved identity belongs to connection '{}', not '{}'",
            identity.connection_name(),
            request.connection_name()
        ));
    }

    if !spec.matches_base_url(identity.base_url()) {
        violations.push(format!(
            "connection '{}' resolves to {} but destination '{}' expects {}",
            identity.connection_name(),
            identity.base_url(),
            destination,
            spec.base_url()
        ));
    }

    let claimed_by: Vec<&EnvironmentSpec> = registry.matching_connection(identity.connection_name());
    if !spec.matches_connection(identity.connection_name()) {
        let owners = claimed_by
            .iter()
            .map(|s| s.id().to_string())
            .collect::<Vec<_>>();
        violations.push(format!(
            "connection '{}' does not match pattern '{}' of destination '{}'{}",
            identity.connection_name(),
            spec.connection_pattern(),
            destination,
            if owners.is_empty() {
                String::new()
            } else {
                format!(" (it belongs to: {})", owners.join(", "))
            }
        ));
    } else if claimed_by.len() > 1 {
        let owners = claimed_by
            .iter()
            .map(|s| s.id().to_string())
            .collect::<Vec<_>>();
        violations.push(format!(
            "connection '{}' is claimed by several environments: {}",
            identity.connection_name(),
            owners.join(", ")
        ));
    }

    if violations.is_empty() {
        debug!(
            "Connection '{}' is consistent with destination '{}'",
            identity.connection_name(),
            destination
        );
        Ok(spec)
    } else {
        let message = violations.join("; ");
        error!("Pre-flight validation failed: {}", message);
        Err(PromoteError::InconsistentEnvironment(message))
    }
}
