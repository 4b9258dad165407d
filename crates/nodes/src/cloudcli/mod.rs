//! The Cloud CLI node: environment lifecycle and agent execution.

pub mod description;
pub mod node;

pub use description::{credential_description, node_description};
pub use node::CloudCliNode;

use strum::{Display, EnumString};

use crate::params::Parameters;
use crate::NodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Resource {
    Environment,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EnvironmentOperation {
    List,
    Get,
    Create,
    Delete,
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AgentOperation {
    Execute,
}

/// A resource/operation pair the node knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Environment(EnvironmentOperation),
    Agent(AgentOperation),
}

impl Operation {
    /// Read `resource` and `operation` from a raw parameter bag.
    ///
    /// Missing values fall back to the field defaults (`environment`, then
    /// `list` or `execute`); anything else unrecognised is an error.
    pub fn from_params(params: &Parameters) -> Result<Self, NodeError> {
        let resource = match raw_choice(params, "resource") {
            None => Resource::Environment,
            Some(raw) => raw
                .parse::<Resource>()
                .map_err(|_| NodeError::UnknownResource(raw))?,
        };

        let operation = match (resource, raw_choice(params, "operation")) {
            (Resource::Environment, None) => Operation::Environment(EnvironmentOperation::List),
            (Resource::Environment, Some(raw)) => Operation::Environment(
                raw.parse::<EnvironmentOperation>()
                    .map_err(|_| NodeError::UnknownOperation(raw))?,
            ),
            (Resource::Agent, None) => Operation::Agent(AgentOperation::Execute),
            (Resource::Agent, Some(raw)) => Operation::Agent(
                raw.parse::<AgentOperation>()
                    .map_err(|_| NodeError::UnknownOperation(raw))?,
            ),
        };

        Ok(operation)
    }
}

/// Selection value as text; non-strings are rendered as JSON so they show
/// up verbatim in the error.
fn raw_choice(params: &Parameters, name: &str) -> Option<String> {
    params
        .get(name)
        .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_owned))
}
