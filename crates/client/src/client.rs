//! `CloudCliClient`: one method per REST endpoint.
//!
//! Every call injects the `X-API-KEY` header, sends at most one HTTP request
//! and never retries. Non-2xx answers become [`ClientError::Status`] with the
//! response body attached.

use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{ClientConfig, Credentials, API_KEY_HEADER};
use crate::error::failure_reason;
use crate::models::{AgentExecutionRequest, CreateEnvironmentRequest, EnvironmentStatus};
use crate::ClientError;

/// Async client for the Cloud CLI REST API.
#[derive(Debug)]
pub struct CloudCliClient {
    http: reqwest::Client,
    credentials: Credentials,
    config: ClientConfig,
}

impl CloudCliClient {
    /// Build a client for the given connection.
    ///
    /// # Errors
    /// Returns [`ClientError::Build`] if the TLS backend cannot be initialised.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Build)?;

        Ok(Self {
            http,
            credentials,
            config,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // -----------------------------------------------------------------------
    // Credentials
    // -----------------------------------------------------------------------

    /// `GET /environments`; succeeds iff the key is accepted.
    #[instrument(skip(self), fields(host = %self.credentials.host()))]
    pub async fn test_credentials(&self) -> Result<(), ClientError> {
        self.send_discarding_body(self.request(Method::GET, &["environments"]))
            .await
    }

    // -----------------------------------------------------------------------
    // Environments
    // -----------------------------------------------------------------------

    /// `GET /environments[?status=X]`; returns the raw environment records.
    ///
    /// A response without an `environments` key (or with `null`) is treated
    /// as an empty list; any other non-array value is a [`ClientError::Decode`].
    #[instrument(skip(self))]
    pub async fn list_environments(
        &self,
        status: Option<EnvironmentStatus>,
    ) -> Result<Vec<Value>, ClientError> {
        let mut req = self.request(Method::GET, &["environments"]);
        if let Some(status) = status {
            req = req.query(&[("status", status.to_string())]);
        }

        let (url, body) = self.send_with_url(req).await?;
        let environments = match body.get("environments") {
            None | Some(Value::Null) => Vec::new(),
            Some(list) => Vec::<Value>::deserialize(list)
                .map_err(|source| ClientError::Decode { url, source })?,
        };
        debug!("listed {} environments", environments.len());
        Ok(environments)
    }

    /// `GET /environments/{id}`.
    #[instrument(skip(self))]
    pub async fn get_environment(&self, id: &str) -> Result<Value, ClientError> {
        self.send(self.request(Method::GET, &["environments", id]))
            .await
    }

    /// `POST /environments`.
    #[instrument(skip(self, request), fields(name = %request.name, subdomain = %request.subdomain))]
    pub async fn create_environment(
        &self,
        request: &CreateEnvironmentRequest,
    ) -> Result<Value, ClientError> {
        self.send_json(Method::POST, &["environments"], request).await
    }

    /// `DELETE /environments/{id}`. The response body is discarded.
    #[instrument(skip(self))]
    pub async fn delete_environment(&self, id: &str) -> Result<(), ClientError> {
        self.send_discarding_body(self.request(Method::DELETE, &["environments", id]))
            .await
    }

    /// `POST /environments/{id}/start`.
    #[instrument(skip(self))]
    pub async fn start_environment(&self, id: &str) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, &["environments", id, "start"]))
            .await
    }

    /// `POST /environments/{id}/stop`.
    #[instrument(skip(self))]
    pub async fn stop_environment(&self, id: &str) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, &["environments", id, "stop"]))
            .await
    }

    // -----------------------------------------------------------------------
    // Agent
    // -----------------------------------------------------------------------

    /// `POST /agent/execute`, bounded by [`ClientConfig::agent_timeout`].
    #[instrument(
        skip(self, request),
        fields(environment_id = %request.environment_id, provider = %request.provider)
    )]
    pub async fn execute_agent(
        &self,
        request: &AgentExecutionRequest,
    ) -> Result<Value, ClientError> {
        let req = self
            .request(Method::POST, &["agent", "execute"])
            .json(request)
            .timeout(self.config.agent_timeout);
        self.send(req).await
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http
            .request(method, self.credentials.endpoint(segments))
            .header(API_KEY_HEADER, self.credentials.api_key())
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Value, ClientError> {
        self.send(self.request(method, segments).json(body)).await
    }

    /// Send the request and relay the 2xx body: JSON when it parses, the raw
    /// text as a string otherwise, `Null` when empty.
    async fn send(&self, req: RequestBuilder) -> Result<Value, ClientError> {
        Ok(self.send_with_url(req).await?.1)
    }

    /// Send the request, checking only the status.
    async fn send_discarding_body(&self, req: RequestBuilder) -> Result<(), ClientError> {
        self.send_text(req).await?;
        Ok(())
    }

    async fn send_with_url(&self, req: RequestBuilder) -> Result<(String, Value), ClientError> {
        let (url, text) = self.send_text(req).await?;
        let body = parse_body(&text).unwrap_or(Value::Null);
        Ok((url, body))
    }

    /// Send the request and return the final URL with the raw body of a 2xx
    /// answer. Anything else becomes [`ClientError::Status`].
    async fn send_text(&self, req: RequestBuilder) -> Result<(String, String), ClientError> {
        let response = req.send().await.map_err(|source| ClientError::Transport {
            url: source
                .url()
                .map(|u| u.to_string())
                .unwrap_or_default(),
            source,
        })?;

        let status = response.status();
        let url = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            let body = parse_body(&text);
            let reason = failure_reason(status, body.as_ref());
            warn!("{} answered {}: {}", url, status.as_u16(), reason);
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason,
                body,
            });
        }

        Ok((url, text))
    }
}

/// Bodies are JSON when the API produced them, plain text otherwise.
fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned())))
}
