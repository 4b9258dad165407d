//! `CloudCliNode`: maps one input item to one Cloud CLI API call.

use async_trait::async_trait;
use client::{
    AgentExecutionRequest, AgentProvider, CloudCliClient, CreateEnvironmentRequest, Environment,
    EnvironmentStatus,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use super::description::{node_description, SEARCH_ENVIRONMENTS};
use super::{AgentOperation, EnvironmentOperation, Operation};
use crate::descriptor::NodeDescription;
use crate::params::Parameters;
use crate::traits::{ExecutionContext, ListSearchResult};
use crate::{ExecutableNode, NodeError};

/// Node exposing environment lifecycle management and agent execution.
pub struct CloudCliNode {
    client: CloudCliClient,
    description: NodeDescription,
}

impl CloudCliNode {
    pub fn new(client: CloudCliClient) -> Self {
        Self {
            client,
            description: node_description(),
        }
    }

    pub fn client(&self) -> &CloudCliClient {
        &self.client
    }

    /// Environments whose name, id or subdomain contains `filter`
    /// (case-insensitive), labelled `"<name> (<status>)"`.
    ///
    /// Fetches the full list on every call; an empty filter keeps everything.
    #[instrument(skip(self))]
    pub async fn search_environments(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<ListSearchResult>, NodeError> {
        let filter = filter.filter(|f| !f.is_empty());

        let results: Vec<ListSearchResult> = self
            .client
            .list_environments(None)
            .await?
            .iter()
            .map(Environment::from_json)
            .filter(|env| filter.map_or(true, |f| env.matches(f)))
            .map(|env| ListSearchResult {
                name: format!(
                    "{} ({})",
                    env.name,
                    env.status.as_deref().unwrap_or("unknown")
                ),
                value: env.id,
                url: env.access_url,
            })
            .collect();

        debug!("search matched {} environments", results.len());
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Environment operations
    // -----------------------------------------------------------------------

    async fn run_environment(
        &self,
        operation: EnvironmentOperation,
        params: &Parameters,
    ) -> Result<Vec<Value>, NodeError> {
        match operation {
            EnvironmentOperation::List => {
                let status = params
                    .str("status")
                    .map(|s| {
                        s.parse::<EnvironmentStatus>()
                            .map_err(|_| NodeError::invalid("status", format!("unknown status '{s}'")))
                    })
                    .transpose()?;
                // Fan out: one output item per environment.
                Ok(self.client.list_environments(status).await?)
            }
            EnvironmentOperation::Get => {
                let id = params.locator("environmentId")?.value;
                single(self.client.get_environment(&id).await?)
            }
            EnvironmentOperation::Create => {
                let request = CreateEnvironmentRequest::new(
                    params.required_str("name")?,
                    params.required_str("subdomain")?,
                )
                .with_github_url(params.str("githubUrl"))
                .with_github_token(params.str("githubToken"));
                single(self.client.create_environment(&request).await?)
            }
            EnvironmentOperation::Delete => {
                let id = params.locator("environmentId")?.value;
                self.client.delete_environment(&id).await?;
                Ok(vec![json!({ "deleted": true })])
            }
            EnvironmentOperation::Start => {
                let id = params.locator("environmentId")?.value;
                single(self.client.start_environment(&id).await?)
            }
            EnvironmentOperation::Stop => {
                let id = params.locator("environmentId")?.value;
                single(self.client.stop_environment(&id).await?)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Agent operations
    // -----------------------------------------------------------------------

    async fn run_agent(
        &self,
        operation: AgentOperation,
        params: &Parameters,
    ) -> Result<Vec<Value>, NodeError> {
        match operation {
            AgentOperation::Execute => {
                let environment = params.locator("agentEnvironmentId")?;
                let provider = match params.str("provider") {
                    None => AgentProvider::default(),
                    Some(p) => p.parse::<AgentProvider>().map_err(|_| {
                        NodeError::invalid("provider", format!("unknown provider '{p}'"))
                    })?,
                };
                let options = params.collection("additionalOptions");

                let request = AgentExecutionRequest::new(
                    environment.value,
                    params.required_str("projectName")?,
                    params.required_str("message")?,
                    provider,
                )
                .create_branch(options.flag("createBranch"))
                .create_pr(options.flag("createPR"))
                .with_github_token(options.str("githubToken"));

                single(self.client.execute_agent(&request).await?)
            }
        }
    }
}

#[async_trait]
impl ExecutableNode for CloudCliNode {
    fn description(&self) -> &NodeDescription {
        &self.description
    }

    #[instrument(skip(self, input, ctx), fields(item = ctx.item_index))]
    async fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Vec<Value>, NodeError> {
        let mut raw = Parameters::from_value(input)?;
        let operation = Operation::from_params(&raw)?;
        default_project_name(&mut raw);
        let params = self.description.resolve(&raw)?;

        info!("dispatching {:?}", operation);
        match operation {
            Operation::Environment(op) => self.run_environment(op, &params).await,
            Operation::Agent(op) => self.run_agent(op, &params).await,
        }
    }

    async fn list_search(
        &self,
        method: &str,
        filter: Option<&str>,
    ) -> Result<Vec<ListSearchResult>, NodeError> {
        match method {
            SEARCH_ENVIRONMENTS => self.search_environments(filter).await,
            other => Err(NodeError::UnknownSearchMethod(other.to_owned())),
        }
    }
}

/// Wrap a single-object response as one output payload; an empty body
/// becomes `{}`.
fn single(response: Value) -> Result<Vec<Value>, NodeError> {
    Ok(vec![match response {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }])
}

/// When no project name is given, use the environment name from the label
/// picked in the search list (`"<name> (<status>)"`).
fn default_project_name(raw: &mut Parameters) {
    if raw.str("projectName").is_some() {
        return;
    }
    let derived = raw
        .get("agentEnvironmentId")
        .and_then(|v| v.get("cachedResultName"))
        .and_then(Value::as_str)
        .and_then(|label| label.split_whitespace().next())
        .map(str::to_owned);

    if let Some(name) = derived {
        raw.insert("projectName", Value::String(name));
    }
}
