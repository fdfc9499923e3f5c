//! Environment identities and the immutable registry

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::PromoteError;

/// Closed set of environment tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentId {
    Dev,
    Qa,
    #[serde(alias = "pp")]
    Preprod,
    Prod,
}

impl EnvironmentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentId::Dev => "dev",
            EnvironmentId::Qa => "qa",
            EnvironmentId::Preprod => "preprod",
            EnvironmentId::Prod => "prod",
        }
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentId {
    type Err = PromoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(EnvironmentId::Dev),
            "qa" => Ok(EnvironmentId::Qa),
            "preprod" | "pp" => Ok(EnvironmentId::Preprod),
            "prod" => Ok(EnvironmentId::Prod),
            other => Err(PromoteError::NotFound(format!(
                "unknown environment '{}'",
                other
            ))),
        }
    }
}

/// Configured identity of one environment, as written in the settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub id: EnvironmentId,

    /// Base URL the connection for this tier must resolve to
    pub base_url: String,

    /// Anchored regular expression the connection name must match
    pub connection_pattern: String,

    /// API-side name of the tier, sent as the trigger destination
    pub target_suffix: String,
}

/// Validated environment identity
#[derive(Debug, Clone)]
pub struct EnvironmentSpec {
    id: EnvironmentId,
    base_url: Url,
    connection_pattern: Regex,
    target_suffix: String,
}

impl EnvironmentSpec {
    pub fn new(
        id: EnvironmentId,
        base_url: &str,
        connection_pattern: &str,
        target_suffix: &str,
    ) -> Result<Self, PromoteError> {
        let base_url = normalize_base_url(base_url).map_err(|e| {
            PromoteError::ConfigError(format!("environment '{}': {}", id, e))
        })?;

        let connection_pattern = Regex::new(&format!("^(?:{})$", connection_pattern))
            .map_err(|e| {
                PromoteError::ConfigError(format!(
                    "environment '{}': invalid connection pattern: {}",
                    id, e
                ))
            })?;

        if target_suffix.trim().is_empty() {
            return Err(PromoteError::ConfigError(format!(
                "environment '{}': target suffix is empty",
                id
            )));
        }

        Ok(Self {
            id,
            base_url,
            connection_pattern,
            target_suffix: target_suffix.to_string(),
        })
    }

    pub fn id(&self) -> EnvironmentId {
        self.id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Pattern source without the anchoring wrapper
    pub fn connection_pattern(&self) -> &str {
        let raw = self.connection_pattern.as_str();
        raw.strip_prefix("^(?:")
            .and_then(|s| s.strip_suffix(")$"))
            .unwrap_or(raw)
    }

    pub fn target_suffix(&self) -> &str {
        &self.target_suffix
    }

    pub fn matches_connection(&self, connection_name: &str) -> bool {
        self.connection_pattern.is_match(connection_name)
    }

    pub fn matches_base_url(&self, url: &Url) -> bool {
        self.base_url == *url
    }
}

impl TryFrom<&EnvironmentConfig> for EnvironmentSpec {
    type Error = PromoteError;

    fn try_from(config: &EnvironmentConfig) -> Result<Self, Self::Error> {
        EnvironmentSpec::new(
            config.id,
            &config.base_url,
            &config.connection_pattern,
            &config.target_suffix,
        )
    }
}

/// Immutable mapping from identifier to environment identity.
///
/// Several identifiers may share one base URL (QA and pre-production commonly
/// do), but each identifier owns its own connection pattern.
#[derive(Debug, Clone)]
pub struct EnvironmentRegistry {
    specs: BTreeMap<EnvironmentId, EnvironmentSpec>,
}

impl EnvironmentRegistry {
    pub fn new(specs: Vec<EnvironmentSpec>) -> Result<Self, PromoteError> {
        if specs.is_empty() {
            return Err(PromoteError::ConfigError(
                "no environments configured".to_string(),
            ));
        }

        let mut map = BTreeMap::new();
        for spec in specs {
            if let Some(existing) = map
                .values()
                .find(|s: &&EnvironmentSpec| s.connection_pattern() == spec.connection_pattern())
            {
                return Err(PromoteError::ConfigError(format!(
                    "environments '{}' and '{}' share connection pattern '{}'",
                    existing.id(),
                    spec.id(),
                    spec.connection_pattern()
                )));
            }
            let id = spec.id();
            if map.insert(id, spec).is_some() {
                return Err(PromoteError::ConfigError(format!(
                    "environment '{}' is defined more than once",
                    id
                )));
            }
        }

        Ok(Self { specs: map })
    }

    pub fn from_configs(configs: &[EnvironmentConfig]) -> Result<Self, PromoteError> {
        let specs = configs
            .iter()
            .map(EnvironmentSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(specs)
    }

    /// Look up the identity for an identifier
    pub fn lookup(&self, id: EnvironmentId) -> Result<&EnvironmentSpec, PromoteError> {
        self.specs.get(&id).ok_or_else(|| {
            PromoteError::NotFound(format!("environment '{}' is not registered", id))
        })
    }

    /// Environments whose connection pattern accepts `connection_name`
    pub fn matching_connection(&self, connection_name: &str) -> Vec<&EnvironmentSpec> {
        self.specs
            .values()
            .filter(|spec| spec.matches_connection(connection_name))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvironmentSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Parse a base URL and drop any trailing slash from its path
pub fn normalize_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| format!("invalid base URL '{}': {}", raw, e))?;
    if url.cannot_be_a_base() {
        return Err(format!("'{}' cannot be used as a base URL", raw));
    }
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
