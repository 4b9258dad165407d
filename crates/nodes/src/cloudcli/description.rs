//! Field definitions of the Cloud CLI node and its credential type.

use std::collections::BTreeMap;

use client::DEFAULT_HOST;

use crate::descriptor::{
    CredentialDescription, FieldDefinition, FieldOption, LocatorModeDefinition, NodeDescription,
    RegexValidation, TestRequest,
};
use crate::params::LocatorMode;

pub const NODE_NAME: &str = "cloudCli";
pub const CREDENTIAL_NAME: &str = "cloudCliApi";
pub const SEARCH_ENVIRONMENTS: &str = "searchEnvironments";

/// Pattern an environment id typed by hand must match.
pub const ENVIRONMENT_ID_PATTERN: &str = "^[a-f0-9-]+$";

const ID_PLACEHOLDER: &str = "e.g. 550e8400-e29b-41d4-a716-446655440000";

pub fn credential_description() -> CredentialDescription {
    CredentialDescription {
        name: CREDENTIAL_NAME.into(),
        display_name: "Cloud CLI API".into(),
        documentation_url: Some("https://cloudcli.ai/api-keys".into()),
        properties: vec![
            FieldDefinition::string("host", "Host")
                .required()
                .default_str(DEFAULT_HOST)
                .description("CloudCLI API base URL"),
            FieldDefinition::secret("apiKey", "API Key")
                .required()
                .description("API key from https://cloudcli.ai/api-keys"),
        ],
        authenticate_headers: BTreeMap::from([("X-API-KEY".to_owned(), "{apiKey}".to_owned())]),
        test_request: TestRequest {
            method: "GET".into(),
            url: "/environments".into(),
        },
    }
}

pub fn node_description() -> NodeDescription {
    NodeDescription {
        name: NODE_NAME.into(),
        display_name: "Cloud CLI".into(),
        description: "Manage CloudCLI development environments and run AI agents".into(),
        version: 1,
        credentials: vec![CREDENTIAL_NAME.into()],
        properties: vec![
            FieldDefinition::options(
                "resource",
                "Resource",
                vec![
                    FieldOption::new("Environment", "environment"),
                    FieldOption::new("Agent", "agent"),
                ],
                "environment",
            ),
            environment_operation(),
            agent_operation(),
            environment_locator("environmentId", "The environment to operate on")
                .show_when("resource", &["environment"])
                .show_when("operation", &["get", "delete", "start", "stop"]),
            status_filter(),
            FieldDefinition::string("name", "Name")
                .required()
                .placeholder("e.g. My Backend API")
                .description("Name for the environment (1-50 characters)")
                .show_when("resource", &["environment"])
                .show_when("operation", &["create"]),
            FieldDefinition::string("subdomain", "Subdomain")
                .required()
                .placeholder("e.g. mybackend-abc123")
                .description(
                    "Subdomain for the environment (3-30 characters, lowercase alphanumeric and hyphens)",
                )
                .show_when("resource", &["environment"])
                .show_when("operation", &["create"]),
            FieldDefinition::string("githubUrl", "GitHub URL")
                .placeholder("e.g. https://github.com/username/repo")
                .description("Optional GitHub repository URL to clone")
                .show_when("resource", &["environment"])
                .show_when("operation", &["create"]),
            FieldDefinition::secret("githubToken", "GitHub Token")
                .description("GitHub personal access token for private repositories")
                .show_when("resource", &["environment"])
                .show_when("operation", &["create"]),
            environment_locator(
                "agentEnvironmentId",
                "The running environment to execute the agent on",
            )
            .show_when("resource", &["agent"])
            .show_when("operation", &["execute"]),
            FieldDefinition::string("projectName", "Project Name")
                .required()
                .placeholder("e.g. backend")
                .description(
                    "Name of the project inside /workspace/ directory. Defaults to the name of \
                     the environment picked from the list.",
                )
                .show_when("resource", &["agent"])
                .show_when("operation", &["execute"]),
            FieldDefinition::string("message", "Message")
                .required()
                .rows(4)
                .placeholder("e.g. Add user authentication with JWT")
                .description("Task description for the AI agent")
                .show_when("resource", &["agent"])
                .show_when("operation", &["execute"]),
            FieldDefinition::options(
                "provider",
                "Provider",
                vec![
                    FieldOption::new("Claude", "claude"),
                    FieldOption::new("Codex", "codex"),
                    FieldOption::new("Cursor", "cursor"),
                ],
                "claude",
            )
            .description("AI provider to use")
            .show_when("resource", &["agent"])
            .show_when("operation", &["execute"]),
            FieldDefinition::collection(
                "additionalOptions",
                "Additional Options",
                vec![
                    FieldDefinition::boolean("createBranch", "Create Branch")
                        .description("Whether to create a git branch for the changes"),
                    FieldDefinition::boolean("createPR", "Create Pull Request")
                        .description("Whether to create a pull request after completion"),
                    FieldDefinition::secret("githubToken", "GitHub Token")
                        .description("GitHub token for private repos or PR creation"),
                ],
            )
            .show_when("resource", &["agent"])
            .show_when("operation", &["execute"]),
        ],
    }
}

fn environment_operation() -> FieldDefinition {
    FieldDefinition::options(
        "operation",
        "Operation",
        vec![
            FieldOption::new("Create", "create")
                .describe("Create a new development environment", "Create an environment"),
            FieldOption::new("Delete", "delete").describe(
                "Delete an environment (must be stopped first)",
                "Delete an environment",
            ),
            FieldOption::new("Get", "get")
                .describe("Get details of a specific environment", "Get an environment"),
            FieldOption::new("Get Many", "list")
                .describe("Retrieve a list of environments", "Get many environments"),
            FieldOption::new("Start", "start")
                .describe("Start a stopped environment", "Start an environment"),
            FieldOption::new("Stop", "stop")
                .describe("Stop a running environment", "Stop an environment"),
        ],
        "list",
    )
    .show_when("resource", &["environment"])
}

fn agent_operation() -> FieldDefinition {
    FieldDefinition::options(
        "operation",
        "Operation",
        vec![FieldOption::new("Execute", "execute").describe(
            "Run Claude Code or Cursor agent on a running environment",
            "Execute an agent",
        )],
        "execute",
    )
    .show_when("resource", &["agent"])
}

fn status_filter() -> FieldDefinition {
    FieldDefinition::options(
        "status",
        "Status Filter",
        vec![
            FieldOption::new("All", ""),
            FieldOption::new("Error", "error"),
            FieldOption::new("Running", "running"),
            FieldOption::new("Starting", "starting"),
            FieldOption::new("Stopped", "stopped"),
            FieldOption::new("Stopping", "stopping"),
        ],
        "",
    )
    .description("Filter environments by status")
    .show_when("resource", &["environment"])
    .show_when("operation", &["list"])
}

fn environment_locator(name: &str, description: &str) -> FieldDefinition {
    FieldDefinition::resource_locator(
        name,
        "Environment",
        vec![
            LocatorModeDefinition {
                name: LocatorMode::List,
                display_name: "From List".into(),
                placeholder: Some("Select an environment...".into()),
                search_list_method: Some(SEARCH_ENVIRONMENTS.into()),
                validation: None,
            },
            LocatorModeDefinition {
                name: LocatorMode::Id,
                display_name: "By ID".into(),
                placeholder: Some(ID_PLACEHOLDER.into()),
                search_list_method: None,
                validation: Some(RegexValidation::new(
                    ENVIRONMENT_ID_PATTERN,
                    "Not a valid environment ID",
                )),
            },
        ],
    )
    .required()
    .description(description)
}
