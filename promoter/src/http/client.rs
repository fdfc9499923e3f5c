//! HTTP client implementation

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use graduation_api::ErrorResponse;

/// How the token is presented in the authorization header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Bearer <token>`
    #[default]
    Bearer,

    /// `Basic base64(<token>:)`, as taken by personal-access-token APIs
    Basic,
}

impl AuthScheme {
    fn header_value(&self, token: &SecretString) -> Result<HeaderValue, ApiError> {
        let raw = match self {
            AuthScheme::Bearer => format!("Bearer {}", token.expose_secret()),
            AuthScheme::Basic => {
                format!("Basic {}", BASE64.encode(format!("{}:", token.expose_secret())))
            }
        };
        let mut value = HeaderValue::from_str(&raw)
            .map_err(|_| ApiError::InvalidToken)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Failure of a single API call
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("token contains characters not allowed in a header")]
    InvalidToken,
}

impl ApiError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(e) => !(e.is_builder() || e.is_decode() || e.is_redirect()),
            ApiError::Status { status, .. } => {
                *status == StatusCode::REQUEST_TIMEOUT.as_u16()
                    || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || *status >= 500
            }
            ApiError::Decode(_) | ApiError::InvalidToken => false,
        }
    }
}

/// HTTP client bound to one base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth_scheme: AuthScheme,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        base_url: &Url,
        request_timeout: Duration,
        auth_scheme: AuthScheme,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            auth_scheme,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = self.client.get(&url);
        self.send(request, token, "GET").await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: &SecretString,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = self.client.post(&url).json(body);
        self.send(request, token, "POST").await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &SecretString,
        method: &str,
    ) -> Result<T, ApiError> {
        let response = request
            .header(header::AUTHORIZATION, self.auth_scheme.header_value(token)?)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|e| e.text().map(str::to_string))
                .unwrap_or(text);
            let body = crate::errors::redact(&body, token.expose_secret());
            error!("HTTP {} failed: {} - {}", method, status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
