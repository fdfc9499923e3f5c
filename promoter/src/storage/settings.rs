//! Settings file management

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::authn::{CredentialProvider, EnvCredentialProvider, FileCredentialProvider};
use crate::deploy::SupervisorSettings;
use crate::errors::PromoteError;
use crate::filesys::file::File;
use crate::http::{ApiPaths, AuthScheme, HttpConnector};
use crate::logs::LogLevel;
use crate::registry::{EnvironmentConfig, EnvironmentRegistry};

/// Default settings file name, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "promote.json";

/// Promoter settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Environment topology
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,

    /// Polling configuration
    #[serde(default)]
    pub polling: PollingSettings,

    /// Graduation API configuration
    #[serde(default)]
    pub http: HttpSettings,

    /// Where connection credentials come from
    #[serde(default)]
    pub credentials: CredentialSettings,
}

impl Settings {
    /// Read and check a settings file
    pub async fn load(file: &File) -> Result<Self, PromoteError> {
        let settings: Settings = file.read_json().await.map_err(|e| {
            PromoteError::ConfigError(format!(
                "unable to read settings file {}: {}",
                file.path().display(),
                e
            ))
        })?;
        settings.check()?;
        Ok(settings)
    }

    /// Reject settings that cannot drive a bounded run
    pub fn check(&self) -> Result<(), PromoteError> {
        self.polling.check()?;
        if self.http.request_timeout_secs == 0 {
            return Err(PromoteError::ConfigError(
                "http.request_timeout_secs must be positive".to_string(),
            ));
        }
        if !self.http.status_path.contains("{id}") {
            return Err(PromoteError::ConfigError(
                "http.status_path must contain '{id}'".to_string(),
            ));
        }
        if self.credentials.source == CredentialSource::File && self.credentials.path.is_none() {
            return Err(PromoteError::ConfigError(
                "credentials.path is required when credentials.source is 'file'".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the immutable environment registry
    pub fn registry(&self) -> Result<EnvironmentRegistry, PromoteError> {
        EnvironmentRegistry::from_configs(&self.environments)
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        self.polling.to_supervisor_settings()
    }

    pub fn connector(&self) -> HttpConnector {
        HttpConnector {
            request_timeout: Duration::from_secs(self.http.request_timeout_secs),
            auth_scheme: self.http.auth_scheme,
            paths: ApiPaths {
                trigger: self.http.trigger_path.clone(),
                status: self.http.status_path.clone(),
            },
        }
    }

    pub fn credential_provider(&self) -> Result<Arc<dyn CredentialProvider>, PromoteError> {
        match self.credentials.source {
            CredentialSource::Env => Ok(Arc::new(EnvCredentialProvider::from_process_env())),
            CredentialSource::File => {
                let path = self.credentials.path.clone().ok_or_else(|| {
                    PromoteError::ConfigError("credentials.path is not set".to_string())
                })?;
                Ok(Arc::new(FileCredentialProvider::new(File::new(path))))
            }
        }
    }
}

/// Polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Seconds between polls
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Supervision ceiling in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Consecutive failed status queries before the outcome is unknown
    #[serde(default = "default_max_status_failures")]
    pub max_status_failures: u32,

    /// Growth of the wait after repeated failures (1.0 keeps it flat)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Cap on the wait after a failure, in seconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_interval() -> u64 {
    3
}

fn default_timeout() -> u64 {
    1800
}

fn default_max_status_failures() -> u32 {
    3
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_backoff() -> u64 {
    30
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
            max_status_failures: default_max_status_failures(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl PollingSettings {
    pub fn check(&self) -> Result<(), PromoteError> {
        if self.interval_secs == 0 {
            return Err(PromoteError::ConfigError(
                "polling.interval_secs must be positive".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(PromoteError::ConfigError(
                "polling.timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_status_failures == 0 {
            return Err(PromoteError::ConfigError(
                "polling.max_status_failures must be at least 1".to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(PromoteError::ConfigError(
                "polling.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            poll_interval: Duration::from_secs(self.interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            max_status_failures: self.max_status_failures,
            backoff_multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_secs(self.max_backoff_secs),
        }
    }
}

/// Graduation API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Authorization scheme
    #[serde(default)]
    pub auth_scheme: AuthScheme,

    /// Trigger endpoint path
    #[serde(default = "default_trigger_path")]
    pub trigger_path: String,

    /// Status endpoint path, with `{id}` for the deployment id
    #[serde(default = "default_status_path")]
    pub status_path: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_trigger_path() -> String {
    ApiPaths::default().trigger
}

fn default_status_path() -> String {
    ApiPaths::default().status
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            auth_scheme: AuthScheme::default(),
            trigger_path: default_trigger_path(),
            status_path: default_status_path(),
        }
    }
}

/// Credential source kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    #[default]
    Env,
    File,
}

/// Credential settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialSettings {
    #[serde(default)]
    pub source: CredentialSource,

    /// JSON credentials file, for the `file` source
    #[serde(default)]
    pub path: Option<PathBuf>,
}
