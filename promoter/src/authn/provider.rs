//! Credential providers

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::filesys::file::File;

/// Prefix for environment-variable backed connections
pub const ENV_PREFIX: &str = "PROMOTE_CONNECTION_";

/// Raw material returned by a provider for one connection
#[derive(Debug)]
pub struct ProvidedCredential {
    pub token: SecretString,
    pub base_url: String,
}

/// External store of per-connection identity material
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve a connection name. Failures are opaque to the caller.
    async fn resolve(&self, connection_name: &str) -> anyhow::Result<ProvidedCredential>;
}

/// Connections defined as `PROMOTE_CONNECTION_<NAME>_TOKEN` / `_URL` pairs
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider {
    vars: HashMap<String, String>,
}

impl EnvCredentialProvider {
    /// Snapshot the relevant process environment variables
    pub fn from_process_env() -> Self {
        Self::with_vars(std::env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)))
    }

    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Variable name stem for a connection: upper-cased, non-alphanumerics as `_`
    pub fn var_stem(connection_name: &str) -> String {
        let name: String = connection_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", ENV_PREFIX, name)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn resolve(&self, connection_name: &str) -> anyhow::Result<ProvidedCredential> {
        let stem = Self::var_stem(connection_name);
        let token_var = format!("{}_TOKEN", stem);
        let url_var = format!("{}_URL", stem);
        debug!("Resolving connection '{}' from {}/{}", connection_name, token_var, url_var);

        let token = self
            .vars
            .get(&token_var)
            .ok_or_else(|| anyhow!("{} is not set", token_var))?;
        let base_url = self
            .vars
            .get(&url_var)
            .ok_or_else(|| anyhow!("{} is not set", url_var))?;

        Ok(ProvidedCredential {
            token: SecretString::from(token.clone()),
            base_url: base_url.clone(),
        })
    }
}

#[derive(Deserialize)]
struct ConnectionEntry {
    token: String,
    base_url: String,
}

/// Connections read from a JSON file keyed by connection name.
///
/// The file is read on every resolve; nothing is cached.
#[derive(Debug, Clone)]
pub struct FileCredentialProvider {
    file: File,
}

impl FileCredentialProvider {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialProvider {
    async fn resolve(&self, connection_name: &str) -> anyhow::Result<ProvidedCredential> {
        let path = self.file.path().display().to_string();

        if let Ok(true) = self.file.is_shared_readable().await {
            warn!("Credentials file {} is readable by group or others", path);
        }

        let mut entries: HashMap<String, ConnectionEntry> = self
            .file
            .read_json()
            .await
            .with_context(|| format!("reading credentials file {}", path))?;

        let entry = entries
            .remove(connection_name)
            .ok_or_else(|| anyhow!("connection not present in {}", path))?;

        Ok(ProvidedCredential {
            token: SecretString::from(entry.token),
            base_url: entry.base_url,
        })
    }
}
