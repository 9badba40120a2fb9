//! Bounded-timeout HTTP transport shared by the service clients

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeouts applied to every outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound for a whole request, body included
    pub timeout: Duration,
    /// Upper bound for establishing the TCP/TLS connection
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Default config with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Base URL of an upstream service.
///
/// Endpoints are appended verbatim, so a base carrying a path prefix
/// (`http://host/registry`) keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrl {
    base: String,
}

impl ServiceUrl {
    /// Validate and normalize a base URL (trailing slashes are dropped)
    pub fn parse(base: &str) -> Result<Self> {
        let url = Url::parse(base.trim())?;
        Ok(Self {
            base: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Build the absolute URL of `path` (which must start with `/`)
    pub fn join(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base, path))?)
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }
}

impl std::fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}

/// Shared HTTP transport.
///
/// Cloning is cheap and clones share one connection pool, so a single
/// transport can back both service clients and any number of concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport with the default timeouts
    pub fn new() -> Result<Self> {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom timeouts
    pub fn with_config(config: TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self { client, config })
    }

    /// Timeouts this transport was built with
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Get a reference to the underlying HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Issue a GET request
    pub async fn get(&self, operation: &'static str, url: Url) -> Result<Response> {
        debug!(operation, %url, "GET");
        self.client
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })
    }

    /// Serialize `body` as JSON and POST it
    pub async fn post_json<T>(&self, operation: &'static str, url: Url, body: &T) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|source| ClientError::Serialize { operation, source })?;

        debug!(operation, %url, bytes = payload.len(), "POST");
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })
    }

    /// Require `expected` and decode the body as JSON
    pub async fn read_json<T>(
        &self,
        operation: &'static str,
        response: Response,
        expected: StatusCode,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = read_body(operation, response, expected).await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode { operation, source })
    }

    /// Require `expected` and drain the body without parsing it
    pub async fn expect_status(
        &self,
        operation: &'static str,
        response: Response,
        expected: StatusCode,
    ) -> Result<()> {
        let status = response.status();
        if status != expected {
            return Err(status_error(operation, response).await);
        }

        // The call already succeeded; a failed drain only costs the connection.
        if let Err(e) = response.bytes().await {
            debug!(operation, error = %e, "Failed to drain response body");
        }
        Ok(())
    }
}

/// Read the full body, failing on an unexpected status
async fn read_body(
    operation: &'static str,
    response: Response,
    expected: StatusCode,
) -> Result<Bytes> {
    let status = response.status();
    if status != expected {
        return Err(status_error(operation, response).await);
    }

    response
        .bytes()
        .await
        .map_err(|source| ClientError::Transport { operation, source })
}

/// Consume the body of a non-matching response into an `UpstreamStatus` error
async fn status_error(operation: &'static str, response: Response) -> ClientError {
    let status = response.status();
    let body = match response.bytes().await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    };

    debug!(operation, status = status.as_u16(), "Unexpected upstream status");
    ClientError::upstream_status(operation, status.as_u16(), body)
}
