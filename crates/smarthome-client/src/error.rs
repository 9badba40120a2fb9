//! Error types for smart-home service client operations

use thiserror::Error;

/// Result type alias for service client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Upper bound on the upstream body kept in [`ClientError::UpstreamStatus`]
const MAX_ERROR_BODY: usize = 512;

/// Errors that can occur while talking to the device registry or the
/// telemetry store.
///
/// Every variant produced by a call carries the name of the operation that
/// failed so the handler layer can log and map it without extra context.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The outbound call could not be completed (connect failure, timeout,
    /// body read failure)
    #[error("{operation}: upstream unavailable: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The call completed with a status other than the expected one
    #[error("{operation}: unexpected status code {status}")]
    UpstreamStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The response body could not be parsed into the expected shape
    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The outbound payload could not be encoded
    #[error("{operation}: failed to encode request: {source}")]
    Serialize {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid base or endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// Create an upstream status error, keeping at most a short prefix of
    /// the upstream body
    pub fn upstream_status(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Self::UpstreamStatus {
            operation,
            status,
            body,
        }
    }

    /// Name of the client operation that produced this error, if any
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Transport { operation, .. }
            | Self::UpstreamStatus { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Serialize { operation, .. } => Some(operation),
            Self::InvalidUrl(_) | Self::Build(_) => None,
        }
    }

    /// Status code observed from the upstream, for `UpstreamStatus` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the outbound call hit the configured request timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}
