//! `cloudcli` CLI entry-point.
//!
//! Available sub-commands:
//! - `run`: run a batch of node items from a JSON file.
//! - `search`: list environments matching a filter.
//! - `test-credentials`: check that the API key is accepted.
//! - `describe`: print the node and credential descriptions.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use client::{ClientConfig, CloudCliClient, Credentials, DEFAULT_HOST};
use engine::{BatchExecutor, ExecutorConfig};
use nodes::cloudcli::{credential_description, node_description};
use nodes::CloudCliNode;

#[derive(Parser)]
#[command(
    name = "cloudcli",
    about = "Manage CloudCLI development environments and run AI agents",
    version
)]
struct Cli {
    #[command(flatten)]
    connection: Connection,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Connection {
    /// CloudCLI API base URL.
    #[arg(long, global = true, env = "CLOUDCLI_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// API key from https://cloudcli.ai/api-keys.
    #[arg(long, global = true, env = "CLOUDCLI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Timeout in seconds for ordinary requests (default: none).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Timeout in seconds for agent executions.
    #[arg(long, global = true, default_value_t = 600)]
    agent_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Run a batch of items through the node and print the output items.
    Run {
        /// JSON file holding an array of parameter objects (`-` for stdin).
        items: PathBuf,
        /// Record failing items as `{error, errorDetails}` instead of aborting.
        #[arg(long)]
        continue_on_fail: bool,
    },
    /// Search environments by name, id or subdomain.
    Search {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Verify the host and API key with `GET /environments`.
    TestCredentials,
    /// Print the node and credential descriptions as JSON.
    Describe,
}

impl Connection {
    fn client(&self) -> Result<CloudCliClient> {
        let api_key = self
            .api_key
            .clone()
            .context("no API key: pass --api-key or set CLOUDCLI_API_KEY")?;
        let credentials = Credentials::new(&self.host, api_key)?;
        let config = ClientConfig {
            request_timeout: self.timeout_secs.map(Duration::from_secs),
            agent_timeout: Duration::from_secs(self.agent_timeout_secs),
            ..ClientConfig::default()
        };
        Ok(CloudCliClient::new(credentials, config)?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            items,
            continue_on_fail,
        } => {
            let batch = read_items(&items)?;
            info!("Running {} items against {}", batch.len(), cli.connection.host);

            let node = Arc::new(CloudCliNode::new(cli.connection.client()?));
            let executor = BatchExecutor::new(node, ExecutorConfig { continue_on_fail });

            match executor.run(batch).await {
                Ok(result) => print_json(&serde_json::to_value(&result.items)?)?,
                Err(err) => {
                    let description = err.node_error().description();
                    eprintln!(
                        "❌ {}{}",
                        err,
                        description.map(|d| format!("\n   {d}")).unwrap_or_default()
                    );
                    std::process::exit(1);
                }
            }
        }
        Command::Search { filter } => {
            let node = CloudCliNode::new(cli.connection.client()?);
            let results = node.search_environments(filter.as_deref()).await?;
            print_json(&serde_json::to_value(&results)?)?;
        }
        Command::TestCredentials => {
            let client = cli.connection.client()?;
            match client.test_credentials().await {
                Ok(()) => println!("✅ Credentials accepted by {}", client.credentials().host()),
                Err(e) => {
                    eprintln!("❌ Credential test failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Describe => {
            print_json(&json!({
                "node": node_description(),
                "credential": credential_description(),
            }))?;
        }
    }

    Ok(())
}

/// Read the batch: an array of parameter objects, or one object.
fn read_items(path: &Path) -> Result<Vec<Value>> {
    let content = if path.as_os_str() == OsStr::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("cannot read file {}", path.display()))?
    };

    let parsed: Value = serde_json::from_str(&content).context("invalid JSON")?;
    match parsed {
        Value::Array(items) => Ok(items),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => bail!("expected an array of item objects, got {other}"),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
