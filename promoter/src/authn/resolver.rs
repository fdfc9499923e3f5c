//! Token/endpoint resolver

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::authn::identity::ResolvedIdentity;
use crate::authn::provider::CredentialProvider;
use crate::errors::PromoteError;
use crate::registry::normalize_base_url;

/// Resolves a connection into a fresh identity on every call
#[derive(Clone)]
pub struct IdentityResolver {
    provider: Arc<dyn CredentialProvider>,
}

impl IdentityResolver {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, connection_name: &str) -> Result<ResolvedIdentity, PromoteError> {
        debug!("Resolving credentials for connection '{}'", connection_name);

        let fail = |reason: String| PromoteError::CredentialResolution {
            connection: connection_name.to_string(),
            reason,
        };

        let credential = self
            .provider
            .resolve(connection_name)
            .await
            .map_err(|e| fail(format!("{:#}", e)))?;

        if credential.token.expose_secret().trim().is_empty() {
            return Err(fail("provider returned an empty token".to_string()));
        }

        let base_url = normalize_base_url(&credential.base_url)
            .map_err(|e| fail(crate::errors::redact(&e, credential.token.expose_secret())))?;

        info!(
            "Resolved connection '{}' to {}",
            connection_name, base_url
        );

        Ok(ResolvedIdentity::new(
            credential.token,
            base_url,
            connection_name,
        ))
    }
}
