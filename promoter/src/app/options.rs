//! Run options

use crate::deploy::SupervisorSettings;
use crate::errors::PromoteError;
use crate::storage::settings::Settings;

/// Per-invocation overrides of the settings file
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub poll_interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_status_failures: Option<u32>,
}

/// Options for the orchestrator
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Polling supervisor configuration
    pub supervisor: SupervisorSettings,
}

impl AppOptions {
    /// Merge overrides into the polling settings and check the result
    pub fn from_settings(settings: &Settings, overrides: &RunOverrides) -> Result<Self, PromoteError> {
        let mut polling = settings.polling.clone();
        if let Some(interval) = overrides.poll_interval_secs {
            polling.interval_secs = interval;
        }
        if let Some(timeout) = overrides.timeout_secs {
            polling.timeout_secs = timeout;
        }
        if let Some(max) = overrides.max_status_failures {
            polling.max_status_failures = max;
        }
        polling.check()?;

        Ok(Self {
            supervisor: polling.to_supervisor_settings(),
        })
    }
}
