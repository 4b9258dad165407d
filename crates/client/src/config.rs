//! Credentials and client tuning.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::ClientError;

/// Base URL used when no host is configured.
pub const DEFAULT_HOST: &str = "https://cloudcli.ai/api/v1";

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Client-side timeout for agent executions.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(600);

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// A configured connection to the Cloud CLI API: base URL plus static API key.
pub struct Credentials {
    host: Url,
    api_key: SecretString,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// # Errors
    /// - [`ClientError::InvalidHost`] if `host` is not an absolute URL.
    /// - [`ClientError::MissingApiKey`] if `api_key` is empty.
    pub fn new(host: &str, api_key: impl Into<String>) -> Result<Self, ClientError> {
        let invalid = |source| ClientError::InvalidHost {
            host: host.to_owned(),
            source,
        };
        let host = Url::parse(host.trim()).map_err(invalid)?;
        if host.cannot_be_a_base() {
            return Err(invalid(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        let api_key: String = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }

        Ok(Self {
            host,
            api_key: SecretString::from(api_key),
        })
    }

    /// The base URL every request path is appended to.
    pub fn host(&self) -> &Url {
        &self.host
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Append path segments to the host, keeping any path prefix it carries
    /// (`https://cloudcli.ai/api/v1` + `environments`). Each segment is
    /// percent-encoded, so ids cannot introduce `/` or `?`.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.host.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for [`crate::CloudCliClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout for ordinary requests. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Timeout for `POST /agent/execute`, which runs a whole agent task.
    pub agent_timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
            user_agent: concat!("cloudcli-node/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}
