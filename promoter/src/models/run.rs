//! Run request model

use crate::errors::PromoteError;
use crate::registry::EnvironmentId;

/// One promotion invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    source: String,
    destination: EnvironmentId,
    connection_name: String,
}

impl RunRequest {
    pub fn new(
        source: impl Into<String>,
        destination: &str,
        connection_name: impl Into<String>,
    ) -> Result<Self, PromoteError> {
        let source = source.into().trim().to_string();
        if source.is_empty() {
            return Err(PromoteError::InvalidRequest("source is empty".to_string()));
        }

        let connection_name = connection_name.into().trim().to_string();
        if connection_name.is_empty() {
            return Err(PromoteError::InvalidRequest(
                "connection name is empty".to_string(),
            ));
        }

        let destination = destination
            .parse::<EnvironmentId>()
            .map_err(|e| PromoteError::InvalidRequest(format!("destination: {}", e)))?;

        Ok(Self {
            source,
            destination,
            connection_name,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> EnvironmentId {
        self.destination
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }
}
