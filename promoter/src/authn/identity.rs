//! Resolved identity for a single run

use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Token and endpoint resolved for one connection.
///
/// Lives for one run and is never persisted. The token is only exposed to
/// the HTTP layer when building the authorization header.
#[derive(Debug)]
pub struct ResolvedIdentity {
    token: SecretString,
    base_url: Url,
    connection_name: String,
}

impl ResolvedIdentity {
    pub fn new(token: SecretString, base_url: Url, connection_name: impl Into<String>) -> Self {
        Self {
            token,
            base_url,
            connection_name: connection_name.into(),
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    /// Scrub the token out of text that may have echoed it
    pub fn redact(&self, text: &str) -> String {
        crate::errors::redact(text, self.token.expose_secret())
    }
}
