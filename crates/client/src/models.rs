//! Request and response shapes of the Cloud CLI REST API.
//!
//! Responses are relayed to callers as raw JSON; [`Environment`] is a lenient
//! typed view for the few places that need to read environment fields.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use strum::{Display, EnumString};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Lifecycle state of a remote environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnvironmentStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
    Error,
}

/// A remote development sandbox as reported by `GET /environments`.
///
/// Each field is read on its own: a missing, `null` or oddly-typed field
/// falls back to empty without affecting the others. Numbers and booleans
/// are kept as their string form. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Environment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subdomain: String,
    /// Raw status string; see [`Environment::parsed_status`].
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub access_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub github_url: Option<String>,
}

impl Environment {
    /// Read the typed view out of a raw JSON record.
    pub fn from_json(value: &Value) -> Self {
        Environment::deserialize(value).unwrap_or_default()
    }

    pub fn parsed_status(&self) -> Option<EnvironmentStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Case-insensitive substring match against name, id and subdomain.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.name, &self.id, &self.subdomain]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

// ---------------------------------------------------------------------------
// Create environment
// ---------------------------------------------------------------------------

/// Body of `POST /environments`.
///
/// Optional GitHub fields are only serialized when non-empty.
#[derive(Debug, Serialize)]
pub struct CreateEnvironmentRequest {
    pub name: String,
    pub subdomain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_optional_secret"
    )]
    pub github_token: Option<SecretString>,
}

impl CreateEnvironmentRequest {
    pub fn new(name: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subdomain: subdomain.into(),
            github_url: None,
            github_token: None,
        }
    }

    /// Repository to clone into the new environment. Empty strings are ignored.
    pub fn with_github_url(mut self, url: Option<&str>) -> Self {
        self.github_url = non_empty(url).map(str::to_owned);
        self
    }

    /// Token for private repositories. Empty strings are ignored.
    pub fn with_github_token(mut self, token: Option<&str>) -> Self {
        self.github_token = non_empty(token).map(|t| SecretString::from(t.to_owned()));
        self
    }
}

// ---------------------------------------------------------------------------
// Agent execution
// ---------------------------------------------------------------------------

/// AI provider that runs the agent task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgentProvider {
    #[default]
    Claude,
    Codex,
    Cursor,
}

/// Body of `POST /agent/execute`.
///
/// `createBranch`, `createPR` and `githubToken` are only sent when truthy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentExecutionRequest {
    pub environment_id: String,
    pub project_name: String,
    pub message: String,
    pub provider: AgentProvider,
    #[serde(skip_serializing_if = "is_false")]
    pub create_branch: bool,
    #[serde(rename = "createPR", skip_serializing_if = "is_false")]
    pub create_pr: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_optional_secret"
    )]
    pub github_token: Option<SecretString>,
}

impl AgentExecutionRequest {
    pub fn new(
        environment_id: impl Into<String>,
        project_name: impl Into<String>,
        message: impl Into<String>,
        provider: AgentProvider,
    ) -> Self {
        Self {
            environment_id: environment_id.into(),
            project_name: project_name.into(),
            message: message.into(),
            provider,
            create_branch: false,
            create_pr: false,
            github_token: None,
        }
    }

    pub fn create_branch(mut self, yes: bool) -> Self {
        self.create_branch = yes;
        self
    }

    pub fn create_pr(mut self, yes: bool) -> Self {
        self.create_pr = yes;
        self
    }

    /// Token for private repos or PR creation. Empty strings are ignored.
    pub fn with_github_token(mut self, token: Option<&str>) -> Self {
        self.github_token = non_empty(token).map(|t| SecretString::from(t.to_owned()));
        self
    }
}

// ---------------------------------------------------------------------------
// serde helpers
// ---------------------------------------------------------------------------

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_string(Value::deserialize(deserializer)?))
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn expose_optional_secret<S>(secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secret {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}
