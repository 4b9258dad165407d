//! Error type for the Cloud CLI HTTP client.

use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong while talking to the Cloud CLI API.
#[derive(Debug, Error)]
pub enum ClientError {
    // ------ Configuration errors ------

    /// The configured host is not an absolute URL.
    #[error("invalid host URL '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },

    /// No API key was supplied.
    #[error("API key must not be empty")]
    MissingApiKey,

    /// The underlying `reqwest` client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    // ------ Request errors ------

    /// The remote service answered with a non-2xx status.
    #[error("request failed with status code {status}: {reason}")]
    Status {
        status: u16,
        reason: String,
        /// Response body, parsed as JSON when possible.
        body: Option<Value>,
    },

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx response body did not have the expected shape.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Response body attached to a rejected request.
    pub fn details(&self) -> Option<&Value> {
        match self {
            ClientError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// `true` when the request timed out client-side.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport { source, .. } if source.is_timeout())
    }
}

/// Pick a human-readable reason for a failed response.
///
/// Prefers `error` / `message` fields from a JSON body (either a plain string
/// or an object with its own `message`), then the canonical status text.
pub(crate) fn failure_reason(status: reqwest::StatusCode, body: Option<&Value>) -> String {
    let from_body = body.and_then(|b| {
        ["error", "message"].iter().find_map(|key| match b.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Object(o)) => o
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        })
    });

    from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_owned()
    })
}
